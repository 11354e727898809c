use std::path::PathBuf;

use scene_loader::SkipMode;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DemoOptions {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) scenes: Vec<String>,
    pub(crate) skip_mode: Option<SkipMode>,
    pub(crate) min_time_secs: Option<f32>,
    pub(crate) scene_load_ms: u64,
    pub(crate) activation_ms: u64,
    pub(crate) press_at_tick: Option<u64>,
    pub(crate) allow_at_tick: Option<u64>,
    pub(crate) max_ticks: Option<u64>,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            scenes: Vec::new(),
            skip_mode: None,
            min_time_secs: None,
            scene_load_ms: 1_500,
            activation_ms: 250,
            press_at_tick: None,
            allow_at_tick: None,
            max_ticks: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ParsedArgs {
    Run(DemoOptions),
    Help,
}

pub(crate) fn parse_options(args: &[String]) -> Result<ParsedArgs, String> {
    let mut options = DemoOptions::default();
    let mut index = 0usize;
    while index < args.len() {
        let flag = args[index].as_str();
        if flag == "-h" || flag == "--help" {
            return Ok(ParsedArgs::Help);
        }
        let value = args
            .get(index + 1)
            .ok_or_else(|| format!("missing value for {flag}"))?;
        match flag {
            "--config" => options.config_path = Some(PathBuf::from(value)),
            "--scene" => options.scenes.push(value.clone()),
            "--skip-mode" => {
                options.skip_mode = Some(value.parse::<SkipMode>().map_err(|err| err.to_string())?)
            }
            "--min-time" => {
                options.min_time_secs = Some(
                    value
                        .parse::<f32>()
                        .map_err(|_| format!("invalid --min-time value '{value}' (expected seconds)"))?,
                )
            }
            "--scene-load-ms" => options.scene_load_ms = parse_u64(flag, value)?,
            "--activation-ms" => options.activation_ms = parse_u64(flag, value)?,
            "--press-at-tick" => options.press_at_tick = Some(parse_u64(flag, value)?),
            "--allow-at-tick" => options.allow_at_tick = Some(parse_u64(flag, value)?),
            "--max-ticks" => options.max_ticks = Some(parse_u64(flag, value)?),
            other => return Err(format!("unknown argument '{other}'")),
        }
        index += 2;
    }
    Ok(ParsedArgs::Run(options))
}

fn parse_u64(flag: &str, value: &str) -> Result<u64, String> {
    value
        .parse::<u64>()
        .map_err(|_| format!("invalid {flag} value '{value}' (expected u64)"))
}

pub(crate) fn usage_text() -> String {
    [
        "loading_demo - runs one headless loading screen cycle against a simulated scene loader",
        "",
        "Usage:",
        "  loading_demo [--config <path>] [--scene <name>]... [--skip-mode <mode>] [--min-time <secs>]",
        "               [--scene-load-ms <u64>] [--activation-ms <u64>] [--press-at-tick <u64>]",
        "               [--allow-at-tick <u64>] [--max-ticks <u64>]",
        "",
        "Repeating --scene switches to additive loading.",
        "--allow-at-tick calls allow_completion once that many ticks have run.",
        "Without --max-ticks, manual mode stops 600 ticks after --allow-at-tick (or tick 0).",
        "Skip modes: instant_complete, key_down, any_key, manual",
        "",
        "Defaults:",
        "  config from $SCENE_LOADER_CONFIG, else a single 'demo/main' scene",
        "  --scene-load-ms 1500",
        "  --activation-ms 250",
    ]
    .join("\n")
}
