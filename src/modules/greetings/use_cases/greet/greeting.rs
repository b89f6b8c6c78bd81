pub const ANONYMOUS_GREETING: &str = "This HTTP triggered function executed successfully. Pass a name in the query string or in the request body for a personalized response.";

pub fn greet(name: Option<&str>) -> String {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => format!("Hello, {name}. This HTTP triggered function executed successfully."),
        None => ANONYMOUS_GREETING.to_string(),
    }
}
