use env_logger::Env;
use fastpool::{build, Config, Pool, PoolKind};
use std::{
    io::{self, BufWriter, Write},
    time::Instant,
};


fn run(kind: PoolKind, items: u64) -> Result<(), Box<dyn std::error::Error>> {
    let now = Instant::now();
    let mut out = BufWriter::new(io::sink());
    let mut pool = build(
        kind,
        Config::default().with_threads(8),
        |i: u64| i + 1,
        move |i: u64| {
            let _ = writeln!(out, "{i}");
        },
    )?;
    for i in 0..items {
        pool.add(i).map_err(|_| "pool disconnected")?;
    }
    let metrics = pool.join();
    log::info!(
        "{kind:?}: {items} items in {:?} (stolen {})",
        now.elapsed(),
        metrics.stolen
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let items = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or(1_000_000);

    for kind in [PoolKind::Ordered, PoolKind::Unsorted, PoolKind::Stealing] {
        run(kind, items)?;
    }
    Ok(())
}
