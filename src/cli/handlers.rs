// FILE: src/cli/handlers.rs
use crate::{
    cli::OutputFormat,
    convert_path,
    mapping::MappingEngine,
    source::parse_document,
    Conversion, PipelineError, PipelineOptions, PipelineStats, Result, SemanticNode,
    SemanticTreeBuilder, ValidationResult, Validator, ValidatorOptions,
};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Instant;

// --- CONVERT ---
pub fn handle_convert_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches.get_one::<String>("input").unwrap();
    let format = *matches.get_one::<OutputFormat>("format").unwrap();
    let node_id = matches.get_one::<String>("node").map(|id| normalize_node_id(id));
    let output_path = matches
        .get_one::<String>("output")
        .map(|s| s.to_string())
        .unwrap_or_else(|| default_output_path(input_path, cli.output_directory(), format));

    let options = cli.build_pipeline_options(matches)?;

    if matches.get_flag("watch") {
        watch_and_convert(input_path, &output_path, node_id.as_deref(), options, format)
    } else {
        convert_single_file(input_path, &output_path, node_id.as_deref(), options, format, matches)
    }
}

/// Share links write node ids as `1-2`
fn normalize_node_id(id: &str) -> String {
    id.replace('-', ":")
}

fn default_output_path(input_path: &str, output_directory: Option<&str>, format: OutputFormat) -> String {
    let extension = match format {
        OutputFormat::Tsx => "tsx",
        OutputFormat::Json => "conversion.json",
    };
    let path = Path::new(input_path).with_extension(extension);
    match (output_directory, path.file_name()) {
        (Some(dir), Some(file_name)) => Path::new(dir).join(file_name).to_string_lossy().into_owned(),
        _ => path.to_string_lossy().into_owned(),
    }
}

fn convert_once(
    input_path: &str,
    output_path: &str,
    node_id: Option<&str>,
    options: PipelineOptions,
    format: OutputFormat,
) -> Result<Conversion> {
    let conversion = convert_path(input_path, node_id, options)?;
    let artifact = match format {
        OutputFormat::Tsx => conversion.output.source_text.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(&conversion)?,
    };
    fs::write(output_path, artifact)?;
    Ok(conversion)
}

fn convert_single_file(
    input_path: &str,
    output_path: &str,
    node_id: Option<&str>,
    options: PipelineOptions,
    format: OutputFormat,
    matches: &clap::ArgMatches,
) -> Result<()> {
    println!("🔨 Converting {} -> {}", input_path, output_path);

    let convert_start = Instant::now();
    let conversion = convert_once(input_path, output_path, node_id, options, format)?;
    let convert_time = convert_start.elapsed();

    println!("✅ Conversion successful!");
    println!("   Component: {}", conversion.output.component_name);
    println!("   Output: {} bytes", conversion.stats.output_size);
    println!("   Time: {:.2}ms", convert_time.as_millis());
    if let Some(score) = conversion.stats.score {
        println!("   Quality score: {}/100", score);
    }

    for diagnostic in conversion.diagnostics() {
        println!("   {}", diagnostic);
    }

    if matches.get_flag("stats") {
        print_detailed_stats(&conversion.stats)?;
    }

    Ok(())
}

fn watch_and_convert(
    input_path: &str,
    output_path: &str,
    node_id: Option<&str>,
    options: PipelineOptions,
    format: OutputFormat,
) -> Result<()> {
    println!("👀 Watching {} for changes...", input_path);

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                if let Err(e) = tx.send(event) {
                    eprintln!("Watch error: {}", e);
                }
            }
        },
        notify::Config::default(),
    )
    .map_err(|e| {
        PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to create file watcher: {}", e),
        ))
    })?;

    watcher
        .watch(Path::new(input_path), RecursiveMode::NonRecursive)
        .map_err(|e| {
            PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Failed to watch file: {}", e),
            ))
        })?;

    if let Err(e) = convert_once(input_path, output_path, node_id, options.clone(), format) {
        eprintln!("❌ Initial conversion failed: {}", e);
    } else {
        println!("✅ Initial conversion successful");
    }

    loop {
        match rx.recv() {
            Ok(_event) => {
                println!("🔄 File changed, reconverting...");
                match convert_once(input_path, output_path, node_id, options.clone(), format) {
                    Ok(conversion) => {
                        println!(
                            "✅ Reconverted successfully ({} bytes, {}ms)",
                            conversion.stats.output_size, conversion.stats.total_time_ms
                        );
                    }
                    Err(e) => eprintln!("❌ Conversion failed: {}", e),
                }
            }
            Err(e) => {
                eprintln!("Watch error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

// --- VALIDATE ---
pub fn handle_validate_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches.get_one::<String>("input").unwrap();
    let recursive = matches.get_flag("recursive");
    let options = cli.build_validator_options(matches);
    let validator = Validator::with_catalog(cli.load_catalog(matches)?);

    if recursive && Path::new(input_path).is_dir() {
        validate_directory_recursive(&validator, input_path, &options)
    } else {
        let result = validate_single_file(&validator, Path::new(input_path), &options)?;
        if result.is_valid {
            Ok(())
        } else {
            Err(PipelineError::ValidationFailed { failed: 1, total: 1 })
        }
    }
}

fn validate_single_file(validator: &Validator, path: &Path, options: &ValidatorOptions) -> Result<ValidationResult> {
    println!("🔍 Validating {}", path.display());
    let source = fs::read_to_string(path).map_err(|e| PipelineError::FileNotFound {
        path: format!("{}: {}", path.display(), e),
    })?;

    let result = validator.validate(&source, options);
    for diagnostic in result.diagnostics() {
        println!("   {}", diagnostic);
    }
    for suggestion in &result.suggestions {
        println!("   💡 {}", suggestion);
    }

    if result.is_valid {
        println!("✅ {} - score {}/100", path.display(), result.score);
    } else {
        println!(
            "❌ {} - {} errors, score {}/100",
            path.display(),
            result.errors.len(),
            result.score
        );
    }
    Ok(result)
}

fn is_component_source(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("tsx") | Some("jsx"))
}

fn validate_directory_recursive(validator: &Validator, dir_path: &str, options: &ValidatorOptions) -> Result<()> {
    let mut total_files = 0;
    let mut error_files = 0;
    let mut total_score = 0u64;

    for entry in walkdir::WalkDir::new(dir_path) {
        let entry = entry.map_err(|e| {
            PipelineError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Directory traversal error: {}", e),
            ))
        })?;
        if entry.file_type().is_file() && is_component_source(entry.path()) {
            total_files += 1;
            match validate_single_file(validator, entry.path(), options) {
                Ok(result) => {
                    total_score += u64::from(result.score);
                    if !result.is_valid {
                        error_files += 1;
                    }
                }
                Err(e) => {
                    println!("❌ {} - {}", entry.path().display(), e);
                    error_files += 1;
                }
            }
        }
    }

    println!("\n📊 Validation Summary:");
    println!("   Total files: {}", total_files);
    println!("   Files with errors: {}", error_files);
    if total_files > 0 {
        println!(
            "   Success rate: {:.1}%",
            (total_files - error_files) as f64 / total_files as f64 * 100.0
        );
        println!("   Average score: {:.1}", total_score as f64 / total_files as f64);
    }

    if error_files > 0 {
        Err(PipelineError::ValidationFailed {
            failed: error_files,
            total: total_files,
        })
    } else {
        Ok(())
    }
}

// --- INSPECT ---
pub fn handle_inspect_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches.get_one::<String>("input").unwrap();
    let output_path = matches.get_one::<String>("output");
    let node_id = matches.get_one::<String>("node").map(|id| normalize_node_id(id));

    println!("🔬 Inspecting {}", input_path);

    let content = fs::read_to_string(input_path).map_err(|e| PipelineError::FileNotFound {
        path: format!("{}: {}", input_path, e),
    })?;
    let raw = parse_document(&content, node_id.as_deref())?;
    let mut builder = SemanticTreeBuilder::new();
    let root = builder.ingest(&raw, node_id.as_deref())?;

    let report = if matches.get_flag("mappings") {
        let options = cli.build_pipeline_options(matches)?;
        let engine = MappingEngine::new(cli.load_catalog(matches)?, options.mapping);
        serde_json::to_string_pretty(&candidate_tree(&engine, &root, None))?
    } else {
        serde_json::to_string_pretty(&root)?
    };

    if let Some(output_file) = output_path {
        fs::write(output_file, report)?;
        println!("✅ Inspection saved to {}", output_file);
    } else {
        println!("{}", report);
    }
    println!(
        "   {} nodes, {} without geometry",
        builder.nodes_built(),
        builder.missing_geometry()
    );
    Ok(())
}

/// Node outline with every candidate above the confidence threshold.
///
/// Children are scored with the best candidate of their parent as context.
fn candidate_tree(engine: &MappingEngine, node: &SemanticNode, context: Option<&str>) -> Value {
    let candidates = engine.propose_mappings(node, context);
    let child_context = match (context, candidates.first()) {
        (Some(ctx), Some((entry, _))) => Some(format!("{}/{}", ctx, entry.name)),
        (None, Some((entry, _))) => Some(entry.name.clone()),
        (ctx, None) => ctx.map(str::to_string),
    };

    json!({
        "id": node.id,
        "name": node.name,
        "kind": node.kind,
        "candidates": candidates
            .iter()
            .map(|(entry, confidence)| json!({ "component": entry.name, "confidence": confidence }))
            .collect::<Vec<_>>(),
        "children": node
            .children
            .iter()
            .map(|child| candidate_tree(engine, child, child_context.as_deref()))
            .collect::<Vec<_>>(),
    })
}

// --- CATALOG ---
pub fn handle_catalog_command(cli: &super::EnhancedCli, matches: &clap::ArgMatches) -> Result<()> {
    let catalog = cli.load_catalog(matches)?;

    if let Some(name) = matches.get_one::<String>("name") {
        let entry = catalog.get(name).ok_or_else(|| PipelineError::Catalog {
            message: format!("'{}' is not in the catalog", name),
        })?;
        println!("{}", serde_json::to_string_pretty(entry.as_ref())?);
        return Ok(());
    }

    let names = catalog.component_names();
    println!("📚 {} catalog components:", names.len());
    for name in names {
        match catalog.get(&name) {
            Some(entry) => println!("   {:<20} {:<14} {}", entry.name, entry.category.to_string(), entry.import_statement),
            None => println!("   {}", name),
        }
    }
    Ok(())
}

fn print_detailed_stats(stats: &PipelineStats) -> Result<()> {
    println!("\n📊 Detailed Conversion Statistics:");
    println!("   Semantic nodes: {}", stats.semantic_nodes);
    if stats.missing_geometry > 0 {
        println!("   Without geometry: {}", stats.missing_geometry);
    }
    println!("   Mapped components: {}", stats.mapped_components);
    println!("   Dropped nodes: {}", stats.dropped_nodes);
    println!("   Imports: {}", stats.import_count);
    println!("   Output size: {} bytes", stats.output_size);
    println!("   Mapping time: {}ms", stats.mapping_time_ms);
    println!("   Total time: {}ms", stats.total_time_ms);
    println!("\n   Diagnostics:");
    println!("     Errors: {}", stats.error_count);
    println!("     Warnings: {}", stats.warning_count);
    if let Some(score) = stats.score {
        println!("     Score: {}/100", score);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_path() {
        assert_eq!(default_output_path("designs/checkout.json", None, OutputFormat::Tsx), "designs/checkout.tsx");
        assert_eq!(
            default_output_path("designs/checkout.json", None, OutputFormat::Json),
            "designs/checkout.conversion.json"
        );
        assert_eq!(
            default_output_path("designs/checkout.json", Some("out"), OutputFormat::Tsx),
            Path::new("out").join("checkout.tsx").to_string_lossy()
        );
    }

    #[test]
    fn test_node_id_normalization() {
        assert_eq!(normalize_node_id("12-34"), "12:34");
        assert_eq!(normalize_node_id("12:34"), "12:34");
    }

    #[test]
    fn test_component_source_filter() {
        assert!(is_component_source(Path::new("src/Button.tsx")));
        assert!(is_component_source(Path::new("src/Button.jsx")));
        assert!(!is_component_source(Path::new("src/button.ts")));
    }
}
