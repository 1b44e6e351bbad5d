//! Web server for the Flegrei dashboard.
//!
//! Serves a single page with the date picker, magnitude/depth bounds and an
//! "Update" button. Every update calls `/api/dashboard`, which re-runs the
//! whole pipeline from a fresh fetch; the server keeps no event state.
//! Map panels are drawn client-side with deck.gl from the layer
//! descriptors.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cli::SelectionArgs;
use crate::client::IngvClient;
use crate::config::DEFAULT_BIN_COUNT;
use crate::dashboard::{DASHBOARD_PANELS, Dashboard};
use crate::errors::FlegreiError;
use crate::pipeline;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Endpoint queried on every refresh
    feed_url: String,
}

/// Query parameters of `/api/dashboard`. Missing values take the selector
/// defaults.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub min_magnitude: Option<f64>,
    pub max_magnitude: Option<f64>,
    pub min_depth: Option<f64>,
    pub max_depth: Option<f64>,
    pub bins: Option<usize>,
}

impl From<DashboardParams> for SelectionArgs {
    fn from(p: DashboardParams) -> Self {
        Self {
            start: p.start,
            end: p.end,
            min_magnitude: p.min_magnitude,
            max_magnitude: p.max_magnitude,
            min_depth: p.min_depth,
            max_depth: p.max_depth,
            bins: p.bins.unwrap_or(DEFAULT_BIN_COUNT),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

/// Map an error to a status and JSON body.
fn error_response(err: &FlegreiError) -> Response {
    let status = match err {
        FlegreiError::Fetch(_) => StatusCode::BAD_GATEWAY,
        FlegreiError::InvalidSelection(_) => StatusCode::BAD_REQUEST,
        FlegreiError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorBody {
        kind: err.kind(),
        message: err.to_string(),
    };
    (status, Json(body)).into_response()
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/dashboard", get(dashboard_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState {
        feed_url: crate::config::INGV_QUERY_URL.to_string(),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("🌋 Flegrei dashboard starting at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Main page handler - serves the HTML UI.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint.
async fn health_handler() -> &'static str {
    "OK"
}

/// Dashboard handler - one full pipeline run per request.
async fn dashboard_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let today = Local::now().date_naive();
    let selection = match SelectionArgs::from(params).to_selection(today) {
        Ok(s) => s,
        Err(e) => return error_response(&e),
    };

    // The blocking client must live and die off the async workers
    let result = tokio::task::spawn_blocking(move || -> Result<Dashboard, FlegreiError> {
        let client = IngvClient::with_base_url(&state.feed_url)?;
        pipeline::run(&client, &selection, &DASHBOARD_PANELS)
    })
    .await;

    match result {
        Ok(Ok(dashboard)) => Json(dashboard).into_response(),
        Ok(Err(e)) => {
            if e.is_fetch_failure() {
                tracing::warn!("feed fetch failed, run halted: {}", e);
            } else {
                tracing::debug!("rejected dashboard request: {}", e);
            }
            error_response(&e)
        }
        Err(e) => {
            tracing::error!("dashboard task panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

// ============================================================================
// HTML Template (embedded for single-binary deployment)
// ============================================================================

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en" data-theme="dark">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Flegrei · Campi Flegrei seismicity</title>
    <script src="https://unpkg.com/deck.gl@9.0.0/dist.min.js"></script>
    <script src="https://unpkg.com/maplibre-gl@4.1.0/dist/maplibre-gl.js"></script>
    <link href="https://unpkg.com/maplibre-gl@4.1.0/dist/maplibre-gl.css" rel="stylesheet">
    <style>
        :root {
            --bg: #111318; --surface: #1d2026; --text: #e2e2e9; --muted: #8e9099;
            --primary: #fd8d3c; --error: #ffb4ab; --radius: 12px;
        }
        * { box-sizing: border-box; }
        body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg); color: var(--text); }
        header { padding: 16px 24px; display: flex; align-items: center; gap: 12px; }
        header h1 { font-size: 20px; margin: 0; }
        .controls { display: flex; flex-wrap: wrap; gap: 12px; padding: 0 24px 16px; align-items: end; }
        .controls label { display: flex; flex-direction: column; font-size: 12px; color: var(--muted); gap: 4px; }
        .controls input { background: var(--surface); color: var(--text); border: 1px solid #44474e; border-radius: 8px; padding: 6px 8px; width: 140px; }
        button { background: var(--primary); color: #201000; border: 0; border-radius: 20px; padding: 8px 20px; font-weight: 600; cursor: pointer; }
        .tabs { display: flex; gap: 4px; padding: 0 24px; border-bottom: 1px solid #44474e; }
        .tab { background: none; color: var(--muted); border-radius: 0; border-bottom: 2px solid transparent; padding: 10px 16px; }
        .tab.active { color: var(--primary); border-bottom-color: var(--primary); }
        #panel { position: relative; height: calc(100vh - 200px); margin: 16px 24px; border-radius: var(--radius); overflow: hidden; background: var(--surface); }
        #panel table { width: 100%; border-collapse: collapse; font-size: 13px; }
        #panel th, #panel td { padding: 6px 10px; text-align: left; border-bottom: 1px solid #2b2e35; }
        #panel .scroll { height: 100%; overflow: auto; }
        .status { padding: 0 24px; font-size: 13px; color: var(--muted); min-height: 18px; }
        .status.error { color: var(--error); }
        .legend { display: inline-flex; gap: 10px; margin-left: 12px; }
        .swatch { display: inline-block; width: 10px; height: 10px; border-radius: 2px; margin-right: 4px; }
        .frame-label { position: absolute; top: 12px; left: 12px; background: #000a; padding: 4px 10px; border-radius: 8px; z-index: 2; }
    </style>
</head>
<body>
    <header><span>🌋</span><h1>Campi Flegrei seismicity</h1></header>

    <form class="controls" id="controls">
        <label>From <input type="date" name="start" id="start"></label>
        <label>To <input type="date" name="end" id="end"></label>
        <label>Min magnitude <input type="number" step="0.1" name="min_magnitude"></label>
        <label>Max magnitude <input type="number" step="0.1" name="max_magnitude"></label>
        <label>Min depth (km) <input type="number" step="0.1" name="min_depth"></label>
        <label>Max depth (km) <input type="number" step="0.1" name="max_depth"></label>
        <label>Bins <input type="number" min="1" max="9" name="bins" value="3"></label>
        <button type="submit">Update</button>
    </form>

    <div class="status" id="status">Loading…</div>
    <nav class="tabs" id="tabs"></nav>
    <div id="panel"></div>

    <script>
        const fmt = d => d.toISOString().slice(0, 10);
        const today = new Date();
        const earliest = new Date(today); earliest.setMonth(earliest.getMonth() - 3);
        const weekAgo = new Date(today); weekAgo.setDate(weekAgo.getDate() - 7);
        for (const id of ['start', 'end']) {
            const el = document.getElementById(id);
            el.min = fmt(earliest); el.max = fmt(today);
        }
        document.getElementById('start').value = fmt(weekAgo);
        document.getElementById('end').value = fmt(today);

        let dashboard = null, active = 0, deckInstance = null, timer = null;

        function accessor(expr) {
            const field = expr.replace('@@=', '');
            if (field === '[longitude, latitude]') return d => [d.longitude, d.latitude];
            return d => d[field];
        }

        function toLayer(desc) {
            const props = {};
            for (const [k, v] of Object.entries(desc)) {
                if (k === '@@type') continue;
                props[k] = (typeof v === 'string' && v.startsWith('@@=')) ? accessor(v) : v;
            }
            return new deck[desc['@@type']](props);
        }

        function clearPanel() {
            if (timer) { clearInterval(timer); timer = null; }
            if (deckInstance) { deckInstance.finalize(); deckInstance = null; }
            document.getElementById('panel').innerHTML = '';
        }

        function renderMap(data) {
            const tooltip = data.tooltip
                ? (({ object }) => object && (data.tooltip.text
                    .replace('{cellCount}', object.cellCount ?? '')
                    .replace('{elevationValue}', object.elevationValue ?? '')
                    .replace('{time}', object.time ?? '')
                    .replace('{magnitude}', object.magnitude ?? '')
                    .replace('{depthKm}', object.depthKm ?? '')))
                : null;
            deckInstance = new deck.DeckGL({
                container: 'panel',
                mapStyle: data.mapStyle,
                initialViewState: data.initialViewState,
                controller: true,
                layers: data.layers.map(toLayer),
                getTooltip: tooltip,
            });
        }

        function renderTimelapse(data) {
            const panel = document.getElementById('panel');
            const label = document.createElement('div');
            label.className = 'frame-label';
            panel.appendChild(label);
            deckInstance = new deck.DeckGL({
                container: 'panel',
                mapStyle: data.mapStyle,
                initialViewState: data.initialViewState,
                controller: true,
            });
            if (!data.frames.length) { label.textContent = 'No frames'; return; }
            let i = 0;
            const show = () => {
                const frame = data.frames[i];
                label.textContent = frame.date;
                deckInstance.setProps({ layers: [new deck.ScatterplotLayer({
                    id: 'timelapse', data: frame.points, radiusUnits: 'pixels',
                    getPosition: d => [d.longitude, d.latitude],
                    getRadius: d => d.size / 2, getFillColor: d => d.color,
                })] });
                i = (i + 1) % data.frames.length;
            };
            show();
            timer = setInterval(show, data.frameDurationMs);
        }

        function el(tag, text, className) {
            const node = document.createElement(tag);
            if (text !== undefined) node.textContent = text;
            if (className) node.className = className;
            return node;
        }

        function swatch(color) {
            const s = el('span', undefined, 'swatch');
            s.style.background = color;
            return s;
        }

        function renderTable(rows) {
            const table = el('table');
            const head = table.createTHead().insertRow();
            for (const h of ['Time', 'Magnitude', 'Depth km', 'Lat', 'Lon', 'Location']) {
                head.appendChild(el('th', h));
            }
            const body = table.createTBody();
            for (const r of rows) {
                const tr = body.insertRow();
                tr.appendChild(el('td', r.time));
                const mag = el('td');
                mag.append(swatch(`rgb(${r.color.map(Number).join(',')})`),
                    `${r.magnitude.toFixed(1)} ${r.magnitude_type ?? ''}`);
                tr.appendChild(mag);
                tr.appendChild(el('td', r.depth_km.toFixed(1)));
                tr.appendChild(el('td', r.latitude.toFixed(4)));
                tr.appendChild(el('td', r.longitude.toFixed(4)));
                tr.appendChild(el('td', r.location));
            }
            const scroll = el('div', undefined, 'scroll');
            scroll.appendChild(table);
            document.getElementById('panel').replaceChildren(scroll);
        }

        function showPanel(index) {
            active = index;
            document.querySelectorAll('.tab').forEach((t, i) => t.classList.toggle('active', i === index));
            clearPanel();
            const { content } = dashboard.panels[index];
            if (content.kind === 'map') renderMap(content.data);
            else if (content.kind === 'timelapse') renderTimelapse(content.data);
            else renderTable(content.data);
        }

        function renderDashboard() {
            const tabs = document.getElementById('tabs');
            tabs.innerHTML = '';
            dashboard.panels.forEach((p, i) => {
                const b = document.createElement('button');
                b.className = 'tab'; b.textContent = p.label;
                b.onclick = () => showPanel(i);
                tabs.appendChild(b);
            });
            const legend = el('span', undefined, 'legend');
            for (const b of dashboard.legend) {
                const entry = el('span');
                entry.append(swatch(b.hex), `${b.min.toFixed(1)}–${b.max.toFixed(1)}`);
                legend.appendChild(entry);
            }
            const status = document.getElementById('status');
            status.className = 'status';
            status.replaceChildren(dashboard.notice ?? `${dashboard.event_count} events`, legend);
            showPanel(Math.min(active, dashboard.panels.length - 1));
        }

        async function refresh(event) {
            if (event) event.preventDefault();
            const params = new URLSearchParams();
            for (const [k, v] of new FormData(document.getElementById('controls'))) {
                if (v !== '') params.append(k, v);
            }
            const status = document.getElementById('status');
            status.className = 'status'; status.textContent = 'Fetching…';
            const resp = await fetch('/api/dashboard?' + params);
            const body = await resp.json();
            if (!resp.ok) {
                dashboard = null; clearPanel();
                document.getElementById('tabs').innerHTML = '';
                status.className = 'status error';
                status.textContent = `${body.message}. Press Update to retry.`;
                return;
            }
            dashboard = body;
            renderDashboard();
        }

        document.getElementById('controls').addEventListener('submit', refresh);
        refresh();
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchFailure;

    #[test]
    fn test_params_fill_defaults() {
        let args = SelectionArgs::from(DashboardParams::default());
        assert_eq!(args.bins, DEFAULT_BIN_COUNT);
        assert!(args.start.is_none());
        assert!(args.min_magnitude.is_none());
    }

    #[test]
    fn test_params_deserialize() {
        let params: DashboardParams = serde_json::from_value(serde_json::json!({
            "start": "2024-05-13",
            "min_magnitude": -0.5,
            "bins": 5
        }))
        .unwrap();
        assert_eq!(params.start, "2024-05-13".parse().ok());
        assert_eq!(params.min_magnitude, Some(-0.5));
        assert_eq!(params.bins, Some(5));
    }

    #[test]
    fn test_error_status() {
        let fetch: FlegreiError = FetchFailure::InvalidResponse("missing columns".into()).into();
        assert_eq!(error_response(&fetch).status(), StatusCode::BAD_GATEWAY);

        let bad = FlegreiError::InvalidSelection("start after end".into());
        assert_eq!(error_response(&bad).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_index_has_update_button() {
        assert!(INDEX_HTML.contains(">Update</button>"));
        assert!(INDEX_HTML.contains("/api/dashboard"));
    }

    #[test]
    fn test_index_never_injects_feed_markup() {
        // innerHTML is only ever used to clear a container
        for line in INDEX_HTML.lines().filter(|l| l.contains("innerHTML")) {
            assert!(line.trim_end().ends_with("innerHTML = '';"), "{line}");
        }
        assert!(!INDEX_HTML.contains("${r.location}"));
        assert!(INDEX_HTML.contains("el('td', r.location)"));
        assert!(INDEX_HTML.contains("status.replaceChildren("));
    }
}
