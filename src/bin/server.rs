use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ridgeline::bbox::{BoundingBox, DEFAULT_BBOX, LatLngBounds};
use ridgeline::colormap::{Colormap, DEFAULT_COLORMAP};
use ridgeline::config::Params;
use ridgeline::elevation::TerrainTiles;
use ridgeline::{Error, render_ridge_map};

#[derive(Deserialize)]
struct RenderRequest {
    /// Current viewport from the map widget; absent until the user has
    /// interacted, in which case the fixed default box is used.
    bounds: Option<LatLngBounds>,
    title: Option<String>,
    num_lines: Option<u32>,
    linewidth: Option<f32>,
    vertical_ratio: Option<u32>,
    lake_flatness: Option<f32>,
    water_ntile: Option<u32>,
    colormap: Option<String>,
}

#[derive(Serialize)]
struct RenderResponse {
    data_url: String,
    width: u32,
    height: u32,
    timings: Vec<TimingEntry>,
}

#[derive(Serialize)]
struct TimingEntry {
    name: String,
    ms: f64,
}

#[derive(Serialize)]
struct ColormapsResponse {
    schemes: Vec<&'static str>,
    default: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn encode_png(rgba: &[u8], w: u32, h: u32) -> String {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder
        .write_image(rgba, w, h, image::ExtendedColorType::Rgba8)
        .expect("PNG encode failed");
    let b64 = base64::engine::general_purpose::STANDARD.encode(&buf);
    format!("data:image/png;base64,{}", b64)
}

fn error_response(err: &Error) -> Response {
    let status = match err {
        Error::DegenerateBbox { .. } | Error::ParamRange { .. } | Error::UnknownColormap(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn render_handler(
    State(tiles): State<Arc<TerrainTiles>>,
    Json(req): Json<RenderRequest>,
) -> Response {
    let defaults = Params::default();
    let colormap = match req.colormap {
        None => defaults.colormap,
        Some(name) => match Colormap::from_name(&name) {
            Some(c) => c,
            None => return error_response(&Error::UnknownColormap(name)),
        },
    };
    let params = Params {
        title: req.title.unwrap_or(defaults.title),
        num_lines: req.num_lines.unwrap_or(defaults.num_lines),
        linewidth: req.linewidth.unwrap_or(defaults.linewidth),
        vertical_ratio: req.vertical_ratio.unwrap_or(defaults.vertical_ratio),
        lake_flatness: req.lake_flatness.unwrap_or(defaults.lake_flatness),
        water_ntile: req.water_ntile.unwrap_or(defaults.water_ntile),
        colormap,
    };
    let bbox = req.bounds.map(BoundingBox::from).unwrap_or(DEFAULT_BBOX);

    info!(
        west = bbox.west,
        south = bbox.south,
        east = bbox.east,
        north = bbox.north,
        num_lines = params.num_lines,
        colormap = params.colormap.name(),
        "render request"
    );

    let result =
        tokio::task::spawn_blocking(move || render_ridge_map(tiles.as_ref(), &bbox, &params))
            .await
            .unwrap();

    match result {
        Ok((figure, timings)) => Json(RenderResponse {
            data_url: encode_png(&figure.rgba, figure.w, figure.h),
            width: figure.w,
            height: figure.h,
            timings: timings
                .iter()
                .map(|t| TimingEntry {
                    name: t.name.to_string(),
                    ms: t.ms,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn colormaps_handler() -> Json<ColormapsResponse> {
    Json(ColormapsResponse {
        schemes: Colormap::ALL.iter().map(|c| c.name()).collect(),
        default: DEFAULT_COLORMAP,
    })
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Fail fast on misconfiguration: the advertised default scheme must
    // resolve, and the bundled title font must parse.
    Colormap::from_name(DEFAULT_COLORMAP).expect("default color scheme missing from registry");
    ridgeline::render::title_font().expect("bundled title font failed to parse");

    let tiles = Arc::new(TerrainTiles::new().expect("failed to build HTTP client"));

    let app = Router::new()
        .route("/api/render", post(render_handler))
        .route("/api/colormaps", get(colormaps_handler))
        .fallback_service(ServeDir::new("frontend"))
        .with_state(tiles);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("ridgeline server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
