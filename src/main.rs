use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

mod card_renderer;
mod game_pool;
mod params;
mod payload;
mod round;

const PARAMS_FILE: &str = "params.json";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Path::new(PARAMS_FILE)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Failed to generate round cards: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(params_path: &Path) -> Result<(), Box<dyn Error>> {
    let base_dir = params_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));

    let params = params::read_params(params_path)?;
    let pool_path = params.pool_path(base_dir);
    let pool = game_pool::read_game_pool(&pool_path)?;
    log::info!(
        "{}: {} strategies, {} deployments, {} schemes from {}",
        params.event_name,
        pool.strategies().len(),
        pool.deployments().len(),
        pool.schemes().len(),
        pool_path.display()
    );

    let rounds = params.rounds as usize;
    pool.validate(rounds)?;
    let mut rng = rand::rng();
    let generated = round::generate_rounds(&pool, rounds, &mut rng)?;

    let font_path = params.font_path.as_ref().map(|p| base_dir.join(p));
    let painter = card_renderer::TextPainter::for_cards(card_renderer::load_font_data(font_path.as_deref())?)?;

    let out_dir = params.output_dir(base_dir);
    fs::create_dir_all(&out_dir)?;
    let ruleset = params.ruleset();
    let created = payload::format_created(&chrono::Local::now());

    for (index, round) in generated.iter().enumerate() {
        let payload = payload::CardPayload::new(round, &ruleset, params.max_crew_size, &params.app_ver, created.clone());
        let path = out_dir.join(format!("img{}.png", index + 1));
        card_renderer::render_card_to_png(round, &params.event_name, &payload.to_json()?, &painter, &path)?;
        log::info!("{} ({}, {}) written to {}", round.name, round.strategy, round.deployment, path.display());
    }
    Ok(())
}
