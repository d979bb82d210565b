use app_launcher::app::{Command, LauncherApp, USAGE};
use app_launcher::config::AppDirs;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let app = LauncherApp::new(AppDirs::resolve());
    std::process::exit(app.run(command));
}
