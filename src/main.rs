fn main() {
    if let Err(err) = way_section_renderer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
