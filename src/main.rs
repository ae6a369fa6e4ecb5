#[cfg(not(feature = "tui"))]
fn main() {
    eprintln!(
        "The news-reader CLI requires the \"tui\" feature. Rebuild with `--features tui` to enable playback."
    );
}

#[cfg(feature = "tui")]
mod cli;

#[cfg(feature = "tui")]
fn main() -> anyhow::Result<()> {
    cli::run()
}
