use serde::Serialize;
use tabled::Tabled;

/// Output for parse command
#[derive(Debug, Serialize)]
pub struct ParseOutput {
    pub input: String,
    pub lat: f64,
    pub lon: f64,
}

/// Output for format command
#[derive(Debug, Serialize)]
pub struct FormatOutput {
    pub lat: String,
    pub lon: String,
    pub text: String,
}

/// Output for crosses command
#[derive(Debug, Serialize)]
pub struct CrossesOutput {
    pub geometry_type: String,
    pub crosses: bool,
}

/// Output for split, merge and interpolate commands
#[derive(Debug, Serialize)]
pub struct GeometryOutput {
    pub geometry_type: String,
    pub vertices: usize,
    pub geometry: serde_json::Value,
}

/// Output for buffer command
#[derive(Debug, Serialize)]
pub struct BufferOutput {
    pub distance_meters: f64,
    pub crs: String,
    pub geometry: Option<serde_json::Value>,
}

/// Output for validate command
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub geometry_type: String,
    /// Repair moved the perimeter past the precision tolerance.
    pub imprecise: bool,
    pub geometry: serde_json::Value,
}

/// Output for distance command
#[derive(Debug, Serialize)]
pub struct DistanceOutput {
    pub method: String,
    pub meters: f64,
    pub distance: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_bearing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_bearing: Option<f64>,
}

/// One row of the config command
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
