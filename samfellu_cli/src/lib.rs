use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::debug;
use owo_colors::{OwoColorize, Stream};
use samfellu::prelude::*;
use samfellu_helpers::basic_samfellu_setup;

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum DirectionsArg {
    #[value(name = "6")]
    Six,
    #[value(name = "5")]
    Five,
    #[value(name = "4")]
    Four,
    #[value(name = "4less")]
    FourLess,
    #[value(name = "3")]
    Three,
    #[value(name = "3less")]
    ThreeLess,
}

impl From<DirectionsArg> for DirectionChoice {
    fn from(arg: DirectionsArg) -> Self {
        match arg {
            DirectionsArg::Six => DirectionChoice::Six,
            DirectionsArg::Five => DirectionChoice::Five,
            DirectionsArg::Four => DirectionChoice::Four,
            DirectionsArg::FourLess => DirectionChoice::FourLess,
            DirectionsArg::Three => DirectionChoice::Three,
            DirectionsArg::ThreeLess => DirectionChoice::ThreeLess,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum NormalizationArg {
    General,
    #[value(name = "none")]
    Flat,
    Manual,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum PaletteArg {
    Default,
    Rgb,
    #[value(name = "5")]
    Five,
    #[value(name = "3")]
    Three,
}

impl From<PaletteArg> for PaletteChoice {
    fn from(arg: PaletteArg) -> Self {
        match arg {
            PaletteArg::Default => PaletteChoice::Default,
            PaletteArg::Rgb => PaletteChoice::Rgb,
            PaletteArg::Five => PaletteChoice::Five,
            PaletteArg::Three => PaletteChoice::Three,
        }
    }
}

/// Draws a text as a line turning with the parts of speech of its words.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct SamfelluCli {
    /// Text file to draw, `-` reads the standard input.
    pub input: String,

    /// PNG file to write.
    pub output: PathBuf,

    /// Encoding of the input text.
    #[arg(short, long)]
    pub encoding: Option<String>,

    /// Image size, WxH.
    #[arg(short = 's', long = "size")]
    pub size: Option<ImageSize>,

    /// Built-in direction set.
    #[arg(short, long)]
    pub directions: Option<DirectionsArg>,

    /// How step lengths are scaled per direction.
    #[arg(short, long)]
    pub normalization: Option<NormalizationArg>,

    /// Step length factors for manual normalization, one per direction.
    #[arg(long, num_args = 1..)]
    pub normals: Vec<f64>,

    /// Draw the direction legend.
    #[arg(short = 'l', long = "legend")]
    pub legend: bool,

    /// Keep the first word in the middle of the image.
    #[arg(long)]
    pub from_center: bool,

    /// Gradient colors along the line, #RGB or #RRGGBB.
    #[arg(short, long, num_args = 1.., conflicts_with = "palette")]
    pub colors: Vec<String>,

    /// Built-in gradient.
    #[arg(short, long)]
    pub palette: Option<PaletteArg>,

    /// Tab separated lexicon consulted before the built-in analyzer.
    #[arg(long)]
    pub dictionary: Option<PathBuf>,

    /// RON configuration file, command line options override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print debug logs.
    #[arg(short, long)]
    pub verbose: bool,
}

impl SamfelluCli {
    /// Merges the configuration file (or the defaults) with the command line.
    pub fn build_config(&self) -> SmfResult<SamfelluConfig> {
        let mut config = match &self.config {
            Some(path) => read_configuration(path)?,
            // The legend is opt-in on the command line.
            None => SamfelluConfig {
                draw_legend: false,
                ..SamfelluConfig::default()
            },
        };
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone();
        }
        if let Some(size) = self.size {
            config.image_size = size;
        }
        if let Some(directions) = self.directions {
            config.directions = directions.into();
            config.custom_directions = None;
        }
        match (self.normalization, self.normals.is_empty()) {
            (Some(NormalizationArg::General | NormalizationArg::Flat), false) => {
                return Err(SmfError::configuration(
                    "--normals only applies to manual normalization",
                ));
            }
            (Some(NormalizationArg::General), true) => {
                config.normalization = Normalization::General
            }
            (Some(NormalizationArg::Flat), true) => config.normalization = Normalization::None,
            (Some(NormalizationArg::Manual), _) | (None, false) => {
                config.normalization = Normalization::Manual(self.normals.clone())
            }
            (None, true) => {}
        }
        if self.legend {
            config.draw_legend = true;
        }
        if self.from_center {
            config.from_center = true;
        }
        if !self.colors.is_empty() {
            config.colors = Some(self.colors.clone());
        } else if let Some(palette) = self.palette {
            config.palette = palette.into();
            config.colors = None;
        }
        Ok(config)
    }

    pub fn source(&self) -> TextSource {
        if self.input == "-" {
            TextSource::Stream(Box::new(std::io::stdin()))
        } else {
            TextSource::File(PathBuf::from(&self.input))
        }
    }

    pub fn analyzer(&self) -> SmfResult<Box<dyn MorphAnalyzer>> {
        let builtin = default_analyzer()?;
        match &self.dictionary {
            Some(path) => Ok(Box::new(DictionaryAnalyzer::from_path(path, builtin)?)),
            None => Ok(builtin),
        }
    }
}

/// Progress line on stdout, rewritten in place.
pub struct ConsoleMonitor<W: Write> {
    out: W,
    total: u64,
    last_percent: Option<u64>,
}

impl<W: Write> ConsoleMonitor<W> {
    pub fn new(out: W) -> Self {
        ConsoleMonitor {
            out,
            total: 0,
            last_percent: None,
        }
    }

    fn percent(&mut self, label: &str, done: u64, total: u64) {
        let percent = done * 100 / total.max(1);
        if self.last_percent == Some(percent) {
            return;
        }
        self.last_percent = Some(percent);
        // Progress output is best effort.
        let _ = write!(self.out, "\r{}: {}%", label, percent);
        let _ = self.out.flush();
    }
}

impl<W: Write> ProgressMonitor for ConsoleMonitor<W> {
    fn stage_started(&mut self, _stage: Stage) {
        self.last_percent = None;
    }

    fn words(&mut self, classified: u64) {
        self.total = classified;
        let _ = write!(self.out, "\rParsing words: {}", classified);
        let _ = self.out.flush();
    }

    fn line_points(&mut self, done: u64, total: u64) {
        self.percent("Constructing line", done, total);
    }

    fn drawn_points(&mut self, done: u64, total: u64) {
        self.percent("Drawing", done, total);
    }

    fn stage_finished(&mut self, stage: Stage) {
        let _ = writeln!(self.out, "\r{}: done ({} words)", stage, self.total);
    }
}

/// Runs a whole conversion from parsed arguments.
pub fn run(args: &SamfelluCli) -> SmfResult<()> {
    let config = args.build_config()?;
    debug!("Effective configuration: {:?}", config);
    let mut samfellu = Samfellu::new(args.source(), config, args.analyzer()?)?
        .with_monitor(Box::new(ConsoleMonitor::new(std::io::stdout())));
    samfellu.process()?;
    samfellu.write_output(&args.output)?;
    if let Some(entries) = samfellu.legend_entries() {
        for (label, count) in entries {
            println!("{}: {}", label, count);
        }
    }
    Ok(())
}

/// The error in red, plain when stderr is not a color terminal.
pub fn error_text(e: &SmfError) -> String {
    e.if_supports_color(Stream::Stderr, |text| text.red())
        .to_string()
}

/// Entry point of the binary, returns the process exit code.
pub fn run_cli() -> i32 {
    let args = SamfelluCli::parse();
    if let Err(e) = basic_samfellu_setup(args.verbose) {
        eprintln!("{}", e);
    }
    match run(&args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", error_text(&e));
            255
        }
    }
}
