use anyhow::{Context, Result};
use clap::Parser;
use csssniff_lib::extract::used_css;
use csssniff_lib::parser::html::create_dom_tree;
use csssniff_lib::style::cssom::StyleSheet;
use csssniff_lib::{serialize_css_rules, PolicyTarget, SniffConfig};
use std::fs;
use std::path::{Path, PathBuf};

const CSSSNIFF_INTRO: &str = r#"
      ___ ___ ___ ___      _  __  __
     / __/ __/ __/ __|_ _ (_)/ _|/ _|
    | (__\__ \__ \__ \ ' \| |  _|  _|
     \___|___/___/___/_||_|_|_| |_|

    csssniff - find the CSS your markup actually uses
"#;

#[derive(Parser)]
#[command(name = "csssniff")]
#[command(about = "Print the CSS rules used by elements of an HTML document")]
struct Args {
    /// Input HTML file.
    input: PathBuf,

    /// Selector for the candidate elements.
    #[arg(short, long, default_value = "body")]
    selector: String,

    /// Only match the selected elements, not their descendants.
    #[arg(long)]
    ignore_children: bool,

    /// JSON configuration file (`ignoreChildren`, `whitelist`, `blacklist`).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PATTERN")]
    whitelist_stylesheet: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    blacklist_stylesheet: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    whitelist_media: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    blacklist_media: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    whitelist_rule: Vec<String>,
    #[arg(long, value_name = "PATTERN")]
    blacklist_rule: Vec<String>,

    /// Extra stylesheet files, matched after the document's own sheets.
    #[arg(long = "css", value_name = "FILE")]
    css: Vec<PathBuf>,

    /// Print the matched rule structure as JSON instead of CSS.
    #[arg(long)]
    json: bool,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not print the banner.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn sniff_config(&self) -> Result<SniffConfig> {
        let mut config = match &self.config {
            Some(path) => SniffConfig::from_path(path)?,
            None => SniffConfig::default(),
        };
        config.ignore_children |= self.ignore_children;

        let whitelists = [
            (PolicyTarget::StyleSheet, &self.whitelist_stylesheet),
            (PolicyTarget::Media, &self.whitelist_media),
            (PolicyTarget::Rule, &self.whitelist_rule),
        ];
        for (target, patterns) in whitelists {
            for pattern in patterns {
                config = config.with_whitelist(target, pattern.as_str());
            }
        }
        let blacklists = [
            (PolicyTarget::StyleSheet, &self.blacklist_stylesheet),
            (PolicyTarget::Media, &self.blacklist_media),
            (PolicyTarget::Rule, &self.blacklist_rule),
        ];
        for (target, patterns) in blacklists {
            for pattern in patterns {
                config = config.with_blacklist(target, pattern.as_str());
            }
        }
        Ok(config)
    }
}

/// Resolves a `<link>` href against the input file's directory. Remote URLs are not fetched.
fn load_linked_css(base_dir: &Path, href: &str) -> Result<String> {
    if href.contains("://") || href.starts_with("//") {
        anyhow::bail!("remote stylesheets are not supported");
    }
    let path = base_dir.join(href.split(['?', '#']).next().unwrap_or(href));
    fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();
    if !args.quiet {
        eprintln!("{}", CSSSNIFF_INTRO);
    }

    let config = args.sniff_config()?;
    let html_content = fs::read_to_string(&args.input)
        .with_context(|| format!("Error reading HTML file {}", args.input.display()))?;

    let mut document = create_dom_tree(&html_content);
    let base_dir = args
        .input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    document.load_linked_style_sheets(|href| load_linked_css(&base_dir, href));
    for path in &args.css {
        let css = fs::read_to_string(path)
            .with_context(|| format!("Error reading CSS file {}", path.display()))?;
        document.add_style_sheet(StyleSheet::parse(&css, None));
    }

    let matched = used_css::extract_from_document(&document, &args.selector, &config)?;
    let rendered = if args.json {
        serde_json::to_string_pretty(&matched)?
    } else {
        serialize_css_rules(&matched)
    };

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Error writing {}", path.display()))?,
        None => println!("{}", rendered),
    }
    Ok(())
}
