use std::sync::Arc;
use std::time::Instant;

use hub_probe::{Configuration, Context, ExceptionRecord, Level, MessageFactory};
use serde_json::json;

fn main() {
    let configuration = Configuration::from_dsn("https://hub.example.com?appName=load&serverName=bench")
        .expect("valid DSN");
    let factory = Arc::new(MessageFactory::with_default_mappers(configuration));

    let n: u64 = 100_000;
    let threads = 4;
    let start = Instant::now();

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let factory = Arc::clone(&factory);
            std::thread::spawn(move || {
                for i in 0..n / threads {
                    let context = Context::new()
                        .with("iteration", i)
                        .with("thread", t)
                        .with("exception", ExceptionRecord::new("LoadError", "synthetic"))
                        .with("payload", json!({"i": i}));
                    let envelope = factory.create_message(Level::Warning, "load test", &context);
                    std::hint::black_box(envelope);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let elapsed = start.elapsed();
    println!(
        "built {} envelopes on {} threads in {:?} (~{:.0} env/s)",
        n,
        threads,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}
