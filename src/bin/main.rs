#[cfg(not(target_arch = "wasm32"))]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    blogpad::init_logging();
    blogpad::native::run(blogpad::config::AppConfig::load()).await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
