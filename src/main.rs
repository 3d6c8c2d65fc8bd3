fn main() -> anyhow::Result<()> {
    lostbox_lib::run()
}
