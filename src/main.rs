use eframe::egui::ViewportBuilder;
use spotifalc_gui::app::App;
use spotifalc_gui::config::Config;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::load().unwrap_or_else(|err| {
        log::error!("Falling back to default config: {err:#}");
        Config::default()
    });

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([420.0, 320.0])
            .with_min_inner_size([320.0, 260.0]),
        ..Default::default()
    };
    let run_res = eframe::run_native(
        "Spotifalc",
        native_options,
        Box::new(
            move |_cc| -> std::result::Result<
                Box<dyn eframe::App>,
                Box<dyn std::error::Error + Send + Sync>,
            > { Ok(Box::new(App::new(config))) },
        ),
    );
    if let Err(e) = run_res {
        return Err(Box::new(e));
    }

    Ok(())
}
