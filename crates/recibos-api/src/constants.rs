/// Current API version, used as the route prefix (`/api/v0/...`).
pub const API_VERSION: &str = "v0";
