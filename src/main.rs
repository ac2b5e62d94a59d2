fn main() -> anyhow::Result<()> {
    bookbench::cli::run()
}
