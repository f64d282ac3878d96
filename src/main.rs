fn main() -> anyhow::Result<()> {
    amble::launch()
}
