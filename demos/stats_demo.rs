use clap::Parser;
use robin_map::HashMap;

#[derive(Parser, Debug)]
struct Args {
    /// Number of sequential keys to insert.
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: u64,

    /// Remove every k-th key after filling, to show backward-shift effects.
    #[arg(short = 'r', long = "remove_every")]
    remove_every: Option<u64>,

    /// Presize the map for `count` entries instead of growing from empty.
    #[arg(short = 'p', long = "presize", default_value_t = false)]
    presize: bool,
}

fn main() {
    let args = Args::parse();

    let mut map: HashMap<u64, u64> = if args.presize {
        HashMap::with_capacity(args.count as usize)
    } else {
        HashMap::new()
    };
    println!("Initial capacity: {}", map.capacity());

    let mut resizes = 0;
    let mut capacity = map.capacity();
    for key in 0..args.count {
        map.insert(key, key * 2);
        if map.capacity() != capacity {
            resizes += 1;
            capacity = map.capacity();
        }
    }

    println!(
        "Inserted {} keys, capacity {} after {} resizes",
        map.len(),
        map.capacity(),
        resizes
    );

    if let Some(step) = args.remove_every.filter(|&step| step > 0) {
        let before = map.capacity();
        let removed = (0..args.count)
            .step_by(step as usize)
            .filter(|key| map.remove(key).is_some())
            .count();
        println!(
            "Removed {} keys, capacity {} -> {}",
            removed,
            before,
            map.capacity()
        );
    }

    println!(
        "Final load factor: {:.2}%",
        (map.len() as f64 / map.capacity() as f64) * 100.0
    );

    map.probe_histogram().print();
    map.debug_stats().print();
}
