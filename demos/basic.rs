//! Basic example: a view counter kept entirely in a signed, encrypted cookie

use salvo::prelude::*;
use salvo_cookie_session::{CookieSessionHandler, SessionConfig, SessionDepotExt};

#[handler]
async fn index(depot: &mut Depot) -> String {
    let session = depot.session_mut().expect("Session not found");

    // Get current view count
    let views: i32 = session.get("views").unwrap_or(0);

    // Increment view count
    if let Err(e) = session.insert("views", views + 1) {
        return format!("Failed to update session: {}", e);
    }

    format!(
        "Hello! You have viewed this page {} time(s).\nNew session: {}",
        views + 1,
        session.is_new()
    )
}

#[handler]
async fn get_user(depot: &mut Depot) -> String {
    let session = depot.session().expect("Session not found");

    match session.get::<String>("user") {
        Some(user) => format!("Logged in as: {}", user),
        None => "Not logged in".to_string(),
    }
}

#[handler]
async fn set_user(req: &mut Request, depot: &mut Depot) -> String {
    // Get username from query parameter
    let username = req
        .query::<String>("name")
        .unwrap_or_else(|| "anonymous".to_string());

    // Remember me: keep this login for a week
    if let Some(options) = depot.session_options_mut() {
        options.max_age = Some(7 * 24 * 3600);
    }

    let session = depot.session_mut().expect("Session not found");
    match session.insert("user", &username) {
        Ok(_) => format!("User set to: {}", username),
        Err(e) => format!("Failed to update session: {}", e),
    }
}

#[handler]
async fn logout(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");

    // Clear all session data, the cookie is re-issued empty
    session.clear();

    "Logged out successfully"
}

#[handler]
async fn destroy_session(depot: &mut Depot) -> &'static str {
    let session = depot.session_mut().expect("Session not found");

    // Expire the cookie on the client
    session.destroy();

    "Session destroyed"
}

#[tokio::main]
async fn main() {
    // Set up logging
    tracing_subscriber::fmt::init();

    // Configure session: the first key signs, the second is still accepted
    let config = SessionConfig::with_keys([
        "your-super-secret-key-change-in-production",
        "previous-key-still-accepted",
    ])
    .with_cookie_name("session")
    .with_encryption_key("an-example-32-byte-encryption-k!")
    .with_max_age(Some(3600)); // 1 hour

    // Create session handler
    let session_handler = match CookieSessionHandler::new(config) {
        Ok(handler) => handler,
        Err(e) => {
            eprintln!("Invalid session configuration: {}", e);
            return;
        }
    };

    // Build router
    let router = Router::new()
        .hoop(session_handler)
        .get(index)
        .push(Router::with_path("user").get(get_user))
        .push(Router::with_path("login").get(set_user))
        .push(Router::with_path("logout").get(logout))
        .push(Router::with_path("destroy").get(destroy_session));

    // Start server
    let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
    println!("Server running at http://127.0.0.1:5800");
    println!("Try these endpoints:");
    println!("  GET /           - View counter");
    println!("  GET /user       - Get current user");
    println!("  GET /login?name=alice - Set user");
    println!("  GET /logout     - Clear session");
    println!("  GET /destroy    - Destroy session");

    Server::new(acceptor).serve(router).await;
}
