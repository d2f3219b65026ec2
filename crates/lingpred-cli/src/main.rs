use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lingpred_lib::{
    config::SubjectConfig,
    io::{
        read_f64_series, read_feature_events, read_numeric_columns, read_roi_bounds,
        write_f64_series, write_trial_tensor, Delimiter as TableDelimiter, FeatureTableSpec,
        RoiTableSpec,
    },
    metrics::correlation::{correlate_features, min_max_normalize, FeatureColumn},
    plot::{figure_from_pair, figure_from_timeseries, Figure, Series},
    predictor::{
        build_predictor_detailed, segment, KernelMode, KernelSpec, Normalization,
        PlacementPolicy, PredictorConfig, SampleRates, TrialLayout,
    },
    subject::run_subject,
    text::{
        lexicon::{read_tagged_tokens, write_annotated_tokens},
        words::{read_token_values, write_word_values},
        annotate_tokens, reconstruct_words, Aggregation, FrequencyLexicon,
    },
    TimeSeries,
};
use log::{info, warn};
use plotters::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "lingpred",
    version,
    about = "Linguistic predictors: word-level features → fixed-rate time series and trials"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Delimiter {
    Auto,
    Comma,
    Semicolon,
    Tab,
}

impl From<Delimiter> for TableDelimiter {
    fn from(d: Delimiter) -> Self {
        match d {
            Delimiter::Auto => TableDelimiter::Auto,
            Delimiter::Comma => TableDelimiter::Comma,
            Delimiter::Semicolon => TableDelimiter::Semicolon,
            Delimiter::Tab => TableDelimiter::Tab,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Normalize {
    None,
    #[value(name = "min-max")]
    MinMax,
}

impl From<Normalize> for Normalization {
    fn from(n: Normalize) -> Self {
        match n {
            Normalize::None => Normalization::None,
            Normalize::MinMax => Normalization::MinMax,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build one stimulus predictor from a feature table and the ROI bounds table
    BuildPredictor {
        #[arg(long)]
        features: PathBuf,
        #[arg(long, default_value = "BEGIN")]
        onset_column: String,
        /// Feature column; omit for a word-onset predictor
        #[arg(long)]
        value_column: Option<String>,
        #[arg(long, value_enum, default_value = "auto")]
        delimiter: Delimiter,
        #[arg(long)]
        skip_missing: bool,
        #[arg(long)]
        bounds: PathBuf,
        #[arg(long, default_value_t = 0)]
        start_row: usize,
        #[arg(long, default_value_t = 1)]
        end_row: usize,
        #[arg(long, default_value = "BEGIN")]
        begin_column: String,
        #[arg(long, default_value = "END")]
        end_column: String,
        #[arg(long, default_value_t = 44100.0)]
        source_rate: f64,
        #[arg(long, default_value_t = 100.0)]
        target_rate: f64,
        #[arg(long, default_value_t = 223.0)]
        duration_s: f64,
        #[arg(long, default_value = "accumulate")]
        policy: PlacementPolicy,
        #[arg(long, default_value = "gaussian")]
        kernel: KernelMode,
        #[arg(long, default_value_t = 3)]
        radius: usize,
        #[arg(long, default_value_t = 1.0)]
        sigma: f64,
        #[arg(long, value_enum, default_value = "none")]
        normalize: Normalize,
        /// Write the series here and print a JSON summary; otherwise print the series
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        plot: Option<PathBuf>,
    },
    /// Concatenate predictor files in listening order and cut them into trials
    SegmentTrials {
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, default_value_t = 100.0)]
        fs: f64,
        #[arg(long, default_value_t = 60.0)]
        trial_s: f64,
        #[arg(long, default_value_t = 15)]
        num_trials: usize,
        #[arg(long, default_value_t = 3)]
        trials_per_source: usize,
        #[arg(long)]
        out: PathBuf,
    },
    /// Run the full per-subject pipeline from a TOML config
    RunSubject {
        #[arg(long)]
        config: PathBuf,
        /// Overrides `[trials].output`
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Pairwise Pearson correlations between word-level features
    Correlate {
        /// NAME:COLUMN:PATH, repeated; the same NAME across files concatenates stories
        #[arg(long = "feature", required = true)]
        features: Vec<String>,
        /// Skip the min-max scaling applied to each concatenated feature
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        plot: Option<PathBuf>,
    },
    /// Merge subword tokens into words and aggregate their values
    ReconstructWords {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "token")]
        token_column: String,
        #[arg(long, default_value = "surprisal")]
        value_column: String,
        #[arg(long, default_value = "mean")]
        agg: Aggregation,
        #[arg(long)]
        out: PathBuf,
    },
    /// Attach Zipf frequency and word class to tagged tokens
    AnnotateLexicon {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        lexicon: PathBuf,
        #[arg(long, default_value = "wordform")]
        word_column: String,
        #[arg(long, default_value = "zipf")]
        zipf_column: String,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::BuildPredictor {
            features,
            onset_column,
            value_column,
            delimiter,
            skip_missing,
            bounds,
            start_row,
            end_row,
            begin_column,
            end_column,
            source_rate,
            target_rate,
            duration_s,
            policy,
            kernel,
            radius,
            sigma,
            normalize,
            out,
            plot,
        } => {
            let table = FeatureTableSpec {
                onset_column,
                value_column,
                delimiter: delimiter.into(),
                skip_missing,
            };
            let roi = RoiTableSpec {
                start_row,
                end_row,
                begin_column,
                end_column,
                delimiter: TableDelimiter::Auto,
            };
            let cfg = PredictorConfig {
                rates: SampleRates::new(source_rate, target_rate)?,
                duration_s,
                policy,
                kernel: KernelSpec {
                    mode: kernel,
                    radius,
                    sigma,
                },
                normalize: normalize.into(),
            };
            cmd_build_predictor(
                &features,
                &table,
                &bounds,
                &roi,
                &cfg,
                out.as_deref(),
                plot.as_deref(),
            )?
        }
        Commands::SegmentTrials {
            inputs,
            fs,
            trial_s,
            num_trials,
            trials_per_source,
            out,
        } => {
            let layout = TrialLayout::from_seconds(trial_s, fs, num_trials, trials_per_source)?;
            cmd_segment_trials(&inputs, fs, &layout, &out)?
        }
        Commands::RunSubject { config, out } => cmd_run_subject(&config, out)?,
        Commands::Correlate {
            features,
            raw,
            plot,
        } => cmd_correlate(&features, !raw, plot.as_deref())?,
        Commands::ReconstructWords {
            input,
            token_column,
            value_column,
            agg,
            out,
        } => cmd_reconstruct_words(&input, &token_column, &value_column, agg, &out)?,
        Commands::AnnotateLexicon {
            input,
            lexicon,
            word_column,
            zipf_column,
            out,
        } => cmd_annotate_lexicon(&input, &lexicon, &word_column, &zipf_column, &out)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct PredictorSummary {
    fs: f64,
    events: usize,
    full_len: usize,
    samples: usize,
    placed: usize,
    dropped: usize,
    collisions: usize,
}

fn cmd_build_predictor(
    features: &Path,
    table: &FeatureTableSpec,
    bounds_path: &Path,
    roi: &RoiTableSpec,
    cfg: &PredictorConfig,
    out: Option<&Path>,
    plot: Option<&Path>,
) -> Result<()> {
    let events = read_feature_events(features, table)?;
    let bounds = read_roi_bounds(bounds_path, roi)?;
    let build = build_predictor_detailed(&events, &bounds, cfg)?;
    if let Some(path) = plot {
        let title = features
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "predictor".into());
        draw_plotters_figures(
            path,
            &[figure_from_timeseries(&title, &build.cropped, 2048, 0x6A51A3)],
        )?;
    }
    match out {
        Some(path) => {
            write_f64_series(path, &build.cropped.data)?;
            info!("saved predictor {}", path.display());
            let summary = PredictorSummary {
                fs: build.cropped.fs,
                events: events.len(),
                full_len: build.full.len(),
                samples: build.cropped.len(),
                placed: build.stats.placed,
                dropped: build.stats.dropped,
                collisions: build.stats.collisions,
            };
            println!("{}", serde_json::to_string(&summary)?);
        }
        None => {
            for v in &build.cropped.data {
                println!("{}", v);
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct TrialsSummary {
    fs: f64,
    n_trials: usize,
    trial_len: usize,
    sources: usize,
    input_samples: usize,
}

fn cmd_segment_trials(inputs: &[PathBuf], fs: f64, layout: &TrialLayout, out: &Path) -> Result<()> {
    let mut series = Vec::with_capacity(inputs.len());
    for path in inputs {
        series.push(TimeSeries {
            fs,
            data: read_f64_series(path)?,
        });
    }
    let tensor = segment(&series, layout, fs);
    let sources = inputs.iter().map(|p| p.display().to_string()).collect();
    write_trial_tensor(out, &tensor, sources)?;
    info!("saved trial tensor {}", out.display());
    let summary = TrialsSummary {
        fs,
        n_trials: tensor.n_trials,
        trial_len: tensor.trial_len,
        sources: inputs.len(),
        input_samples: series.iter().map(TimeSeries::len).sum(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn cmd_run_subject(config: &Path, out: Option<PathBuf>) -> Result<()> {
    let mut cfg = SubjectConfig::from_path(config)?;
    if out.is_some() {
        cfg.trials.output = out;
    }
    let run = run_subject(&cfg)?;
    let summary = run.write(&cfg)?;
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

/// `NAME:COLUMN:PATH`; the path may itself contain `:`.
fn parse_feature_arg(arg: &str) -> Result<(&str, &str, &Path)> {
    let mut parts = arg.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(column), Some(path))
            if !name.is_empty() && !column.is_empty() && !path.is_empty() =>
        {
            Ok((name, column, Path::new(path)))
        }
        _ => bail!("--feature expects NAME:COLUMN:PATH, got {:?}", arg),
    }
}

fn cmd_correlate(features: &[String], normalize: bool, plot: Option<&Path>) -> Result<()> {
    let mut columns: Vec<FeatureColumn> = Vec::new();
    for arg in features {
        let (name, column, path) = parse_feature_arg(arg)?;
        let values = read_numeric_columns(path, &[column], TableDelimiter::Auto)?
            .pop()
            .ok_or_else(|| anyhow!("no column read from {}", path.display()))?;
        match columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values.extend(values),
            None => columns.push(FeatureColumn::new(name, values)),
        }
    }
    if columns.len() < 2 {
        bail!("need at least two distinct feature names to correlate");
    }
    if normalize {
        // one scaling over all stories of a feature
        for column in &mut columns {
            column.values = min_max_normalize(&column.values);
        }
    }
    let pairs = correlate_features(&columns);
    if let Some(path) = plot {
        let palette = [0x8C6BB1, 0x88419D, 0x6E016B];
        let figures: Vec<Figure> = pairs
            .iter()
            .enumerate()
            .filter_map(|(i, pair)| {
                let x = columns.iter().find(|c| c.name == pair.x)?;
                let y = columns.iter().find(|c| c.name == pair.y)?;
                Some(figure_from_pair(x, y, palette[i % palette.len()]))
            })
            .collect();
        draw_plotters_figures(path, &figures)?;
        info!("saved plot {}", path.display());
    }
    println!("{}", serde_json::to_string(&pairs)?);
    Ok(())
}

fn cmd_reconstruct_words(
    input: &Path,
    token_column: &str,
    value_column: &str,
    agg: Aggregation,
    out: &Path,
) -> Result<()> {
    let (tokens, values) = read_token_values(input, token_column, value_column, TableDelimiter::Auto)?;
    let words = reconstruct_words(&tokens, &values, agg)?;
    write_word_values(out, &words, value_column)?;
    info!(
        "{} tokens → {} words ({}), saved {}",
        tokens.len(),
        words.len(),
        agg,
        out.display()
    );
    Ok(())
}

fn cmd_annotate_lexicon(
    input: &Path,
    lexicon: &Path,
    word_column: &str,
    zipf_column: &str,
    out: &Path,
) -> Result<()> {
    let tokens = read_tagged_tokens(input)?;
    let lexicon = FrequencyLexicon::from_csv(lexicon, word_column, zipf_column)?;
    let rows = annotate_tokens(&tokens, &lexicon);
    write_annotated_tokens(out, &rows)?;
    info!("saved CSV {}", out.display());
    Ok(())
}

fn draw_plotters_figures(path: &Path, figures: &[Figure]) -> Result<()> {
    if figures.is_empty() {
        bail!("nothing to plot");
    }
    let size = ((480 * figures.len() as u32).max(800), 480);
    if let Err(err) = render_panels(path, size, figures, true) {
        // no usable system font
        warn!("{}: drawing without text ({})", path.display(), err);
        render_panels(path, size, figures, false)?;
    }
    Ok(())
}

fn render_panels(path: &Path, size: (u32, u32), figures: &[Figure], text: bool) -> Result<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, figures.len()));
    for (fig, area) in figures.iter().zip(panels.iter()) {
        let (x_min, x_max, y_min, y_max) = fig.bounds();
        let mut builder = ChartBuilder::on(area);
        builder.margin(10);
        if text {
            builder
                .caption(
                    fig.title.clone().unwrap_or_else(|| "Plot".into()),
                    ("sans-serif", 20),
                )
                .x_label_area_size(30)
                .y_label_area_size(40);
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        let mut mesh = chart.configure_mesh();
        if text {
            mesh.x_desc(fig.x.label.clone().unwrap_or_default())
                .y_desc(fig.y.label.clone().unwrap_or_default());
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw()?;
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    chart.draw_series(LineSeries::new(
                        line.points.iter().map(|p| (p[0], p[1])),
                        &RGBColor(r, g, b),
                    ))?;
                }
                Series::Scatter(scatter) => {
                    let (r, g, b) = scatter.style.color.rgb();
                    let color = RGBColor(r, g, b);
                    chart.draw_series(
                        scatter
                            .points
                            .iter()
                            .map(|p| Circle::new((p[0], p[1]), scatter.style.width as i32, color.filled())),
                    )?;
                }
            }
        }
    }
    root.present()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
