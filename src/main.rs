use eframe::egui;

mod app;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([480.0, 420.0]),
        ..Default::default()
    };
    let image = std::env::args().nth(1);

    eframe::run_native(
        "Scratch-off",
        options,
        Box::new(|cc| Ok(Box::new(app::ScratchApp::new(cc, image)?))),
    )
}
