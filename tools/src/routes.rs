//! Running routes and gym search. Maps integration is an external
//! collaborator; placeholder payloads for now.

use serde_json::{json, Value};

pub fn generate_running_routes(_location: &str, distance: f64, terrain_preference: Option<String>) -> Value {
    json!([
        {
            "name": "Route 1",
            "distance": distance,
            "terrain": terrain_preference.unwrap_or_else(|| "street".to_string()),
            "elevation_gain": 0,
            "waypoints": []
        }
    ])
}

pub fn find_nearby_gyms(_location: &str, _radius: f64) -> Value {
    json!([])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_defaults_to_street_terrain() {
        let routes = generate_running_routes("Bucharest", 5.0, None);
        assert_eq!(routes[0]["terrain"], "street");
        assert_eq!(routes[0]["distance"], 5.0);
    }
}
