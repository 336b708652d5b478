fn main() {
    if let Err(err) = datagrid_core::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
