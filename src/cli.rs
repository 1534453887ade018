//! CLI argument parsing for callmap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use callmap::graph::{ComponentPolicy, Weighting};
use callmap::projection::{EdgeDetail, EdgeLabel, Granularity};
use callmap::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "callmap",
    about = "Static PHP call-graph mapper",
    long_about = "Scans PHP source trees and renders call sequences from an entry method, \
                  or weighted communication diagrams between components.",
    disable_version_flag = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[arg(short = 'V', long, help = "Print version and build information")]
    pub version: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Configuration file (default: ./callmap.toml if present)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Worker threads for scanning")]
    pub jobs: Option<usize>,

    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "More logging (-v info, -vv debug)"
    )]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Render call sequences starting at entry methods")]
    Sequence(SequenceArgs),

    #[command(about = "Render communication between components")]
    Components(ComponentsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    #[arg(long, help = "Source root (repeatable)")]
    pub src: Vec<PathBuf>,

    #[arg(long, value_delimiter = ',', help = "Exclude glob, e.g. '*/tests/*' (repeatable)")]
    pub exclude: Vec<String>,

    #[arg(long, help = "Do not read or write the package-name cache")]
    pub no_cache: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SequenceArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    #[arg(
        long,
        help = "Entry method, e.g. 'App\\Service\\Foo::bar' (repeatable; default: every public method)"
    )]
    pub entry: Vec<String>,

    #[arg(long, help = "Maximum call depth to follow [default: 3]")]
    pub depth: Option<usize>,

    #[command(flatten)]
    pub sink: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ComponentsArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    #[arg(long, value_enum, help = "Fold to components or keep individual classes")]
    pub granularity: Option<GranularityArg>,

    #[arg(long, value_enum, help = "How classes are grouped into components")]
    pub policy: Option<PolicyArg>,

    #[arg(long, value_enum, help = "Edge weight: every call, or distinct method pairs")]
    pub weighting: Option<WeightingArg>,

    #[arg(long, help = "Keep only the N heaviest edges")]
    pub max_edges: Option<usize>,

    #[arg(long, value_enum, help = "Edge label: weight, method pairs, or both")]
    pub edge_label: Option<EdgeLabelArg>,

    #[arg(long, value_enum, help = "One arrow per component pair, or per method pair")]
    pub edge_detail: Option<EdgeDetailArg>,

    #[arg(long, help = "Only show this component and its neighbours")]
    pub focus: Option<String>,

    #[arg(long, help = "Diagram title", default_value = "Component Communications")]
    pub title: String,

    #[arg(long, help = "Write one drill-down diagram per component into DIR")]
    pub drilldown_dir: Option<PathBuf>,

    #[arg(long, help = "Write drill-downs even for components without edges")]
    pub drilldown_all: bool,

    #[command(flatten)]
    pub sink: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(long, help = "Write output to FILE instead of stdout")]
    pub out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputArg::Human, help = "Output format")]
    pub output: OutputArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputArg {
    Human,
    Json,
    Plantuml,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Human => OutputFormat::Human,
            OutputArg::Json => OutputFormat::Json,
            OutputArg::Plantuml => OutputFormat::PlantUml,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GranularityArg {
    Component,
    Class,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Component => Granularity::Component,
            GranularityArg::Class => Granularity::Class,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    TopSegment,
    PackageName,
}

impl From<PolicyArg> for ComponentPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::TopSegment => ComponentPolicy::TopSegment,
            PolicyArg::PackageName => ComponentPolicy::PackageName,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightingArg {
    Total,
    Unique,
}

impl From<WeightingArg> for Weighting {
    fn from(arg: WeightingArg) -> Self {
        match arg {
            WeightingArg::Total => Weighting::Total,
            WeightingArg::Unique => Weighting::Unique,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLabelArg {
    Counts,
    #[value(alias = "name")]
    Names,
    All,
}

impl From<EdgeLabelArg> for EdgeLabel {
    fn from(arg: EdgeLabelArg) -> Self {
        match arg {
            EdgeLabelArg::Counts => EdgeLabel::Counts,
            EdgeLabelArg::Names => EdgeLabel::Names,
            EdgeLabelArg::All => EdgeLabel::All,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDetailArg {
    Aggregate,
    All,
}

impl From<EdgeDetailArg> for EdgeDetail {
    fn from(arg: EdgeDetailArg) -> Self {
        match arg {
            EdgeDetailArg::Aggregate => EdgeDetail::Aggregate,
            EdgeDetailArg::All => EdgeDetail::All,
        }
    }
}
