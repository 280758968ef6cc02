use gs_optimizer::synthetic::{QuadraticSurface, SurfaceCandidate};
use gs_optimizer::{GridSearch, SearchConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::var("GRIDSEARCH_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading search configuration");
            SearchConfig::from_json_file(&path)?
        }
        Err(_) => SearchConfig::new("demo").with_extension(true, 3).with_execution_slots(4),
    };

    let evaluator = QuadraticSurface::new(2.5, -4.0).with_noise(0.05);
    let data: Vec<u32> = (0..500).collect();

    let search = GridSearch::new(config, SurfaceCandidate::default(), evaluator);
    let fitted = search.fit(data)?;
    info!("\n{}", fitted);

    println!("{}", serde_json::to_string_pretty(&fitted)?);
    Ok(())
}
