/**
 * Smartmarks Desktop App - Main Entry Point
 *
 * Loads configuration, builds the store context and runs the eframe window.
 * The context is shut down after the window closes.
 */
use std::time::Duration;

use eframe::egui;
use smartmarks::egui_app::{theme, views, AppState, Config, StoreContext};
use smartmarks::shared::AppConfig;

/// Repaint cadence while idle, so settled background work shows up
const IDLE_REPAINT: Duration = Duration::from_millis(250);

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,smartmarks=debug".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();
}

fn main() {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();
    init_tracing();

    let app_config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            eprintln!("smartmarks: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Using store at {}", app_config.store_url);

    let context = match StoreContext::new(Config::from_app(app_config)) {
        Ok(context) => context,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 760.0])
            .with_min_inner_size([480.0, 480.0]),
        ..Default::default()
    };

    let app_context = context.clone();
    let result = eframe::run_native(
        "Smartmarks",
        options,
        Box::new(move |cc| {
            theme::apply_global_theme(&cc.egui_ctx);
            Ok(Box::new(SmartmarksApp {
                state: AppState::new(app_context),
            }))
        }),
    );

    if let Err(e) = result {
        tracing::error!("Window error: {}", e);
    }
    context.shutdown();
}

/// Main application state
struct SmartmarksApp {
    state: AppState,
}

impl eframe::App for SmartmarksApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.tick();

        views::render_top_bar(ctx, &mut self.state);
        views::render_main_panel(ctx, &mut self.state);
        views::render_warning(ctx, &mut self.state);

        ctx.request_repaint_after(IDLE_REPAINT);
    }
}
