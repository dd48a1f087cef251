//! Finds every occurrence of a pattern, first with an exact rolling hash and
//! then with a deliberately weak one that forces collision rejection.
//!
//! Set `RUST_LOG=qsearch=debug` to watch the controller transitions.

use qsearch::{PrimeHash, RabinKarp, SearchConfig, SearchError, search};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), SearchError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let text = "abcxabcxabc";
    let pattern = "abc";
    let config = SearchConfig::default().with_verify_all(true);

    println!("Searching {:?} for {:?} (Rabin-Karp)", text, pattern);
    let result = search(text, pattern, &RabinKarp::default(), &config)?;
    println!("{}\n", result);

    // Three hash bits: many windows collide with the pattern.
    let weak = PrimeHash::new(3, 1)?;
    let config = config.with_max_retries(20);
    println!("Searching {:?} for {:?} (3-bit prime hash)", text, pattern);
    let result = search(text, pattern, &weak, &config)?;
    println!("{}", result);

    Ok(())
}
