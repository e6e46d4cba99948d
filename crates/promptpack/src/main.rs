fn main() -> anyhow::Result<()> {
    promptpack::init();
    promptpack::cli::main()
}
