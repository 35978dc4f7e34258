//! `slicegraph compile`

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use slicegraph_config::validate_type_prefix;
use slicegraph_schema::{
    collect_document_union, collect_image_thumbnails_type, shared_type_declarations, to_sdl,
    CustomTypeSchema, PathRegistry, SchemaCompiler, TypeDeclaration, TypeNaming,
};
use tracing::{debug, info};

use crate::cli::OutputFormat;

/// Inputs of one `compile` invocation.
#[derive(Debug, Clone)]
pub struct CompileArgs<'a> {
    pub schema: &'a Path,
    pub custom_type_id: &'a str,
    pub format: OutputFormat,
    pub out_paths: Option<&'a Path>,
    pub type_prefix: &'a str,
}

#[derive(Serialize)]
struct CompileOutput<'a> {
    custom_type_id: &'a str,
    type_declarations: &'a [TypeDeclaration],
    type_paths: &'a PathRegistry,
}

/// Compile the schema file and render every declaration a host needs to
/// serve the custom type: shared types, the custom type's own declarations,
/// then the document union and the thumbnails type.
pub fn run_compile(args: &CompileArgs<'_>) -> Result<String> {
    let source = fs::read_to_string(args.schema)
        .with_context(|| format!("Failed to read schema {}", args.schema.display()))?;
    let schema = CustomTypeSchema::from_json(&source)
        .with_context(|| format!("Invalid custom type schema {}", args.schema.display()))?;

    validate_type_prefix(args.type_prefix)?;
    let compiler = SchemaCompiler::new(TypeNaming::new(args.type_prefix));
    let compiled = compiler.compile(args.custom_type_id, &schema)?;
    let naming = compiler.naming();

    let mut declarations = shared_type_declarations(naming);
    declarations.extend(compiled.type_declarations.iter().cloned());
    let union = collect_document_union(&declarations, naming);
    declarations.push(union.into());
    declarations.push(collect_image_thumbnails_type(&compiled.type_paths, naming));

    info!(
        custom_type = args.custom_type_id,
        declarations = declarations.len(),
        paths = compiled.type_paths.len(),
        "compiled custom type"
    );

    if let Some(out) = args.out_paths {
        let json = serde_json::to_string_pretty(&compiled.type_paths)?;
        fs::write(out, json)
            .with_context(|| format!("Failed to write type paths to {}", out.display()))?;
        debug!(path = %out.display(), "wrote type paths");
    }

    match args.format {
        OutputFormat::Sdl => Ok(to_sdl(&declarations)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&CompileOutput {
            custom_type_id: args.custom_type_id,
            type_declarations: &declarations,
            type_paths: &compiled.type_paths,
        })?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn write_schema(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("page.json");
        let schema = json!({
            "Main": {
                "uid": { "type": "UID", "config": { "label": "Slug" } },
                "title": { "type": "StructuredText", "config": { "single": "heading1" } },
                "hero": {
                    "type": "Image",
                    "config": { "thumbnails": [{ "name": "mobile", "width": 320 }] }
                }
            }
        });
        fs::write(&path, schema.to_string()).unwrap();
        path
    }

    #[test]
    fn test_compile_sdl_lists_document_and_union() {
        let dir = TempDir::new().unwrap();
        let schema = write_schema(&dir);

        let sdl = run_compile(&CompileArgs {
            schema: &schema,
            custom_type_id: "page",
            format: OutputFormat::Sdl,
            out_paths: None,
            type_prefix: "Prismic",
        })
        .unwrap();

        assert!(sdl.contains("type PrismicPage implements Node & PrismicDocument"));
        assert!(sdl.contains("union PrismicAllDocumentTypes = PrismicPage"));
        assert!(sdl.contains("type PrismicImageThumbnailsType"));
        assert!(sdl.find("interface PrismicDocument").unwrap() < sdl.find("type PrismicPage ").unwrap());
    }

    #[test]
    fn test_compile_writes_type_paths() {
        let dir = TempDir::new().unwrap();
        let schema = write_schema(&dir);
        let out = dir.path().join("paths.json");

        let output = run_compile(&CompileArgs {
            schema: &schema,
            custom_type_id: "page",
            format: OutputFormat::Json,
            out_paths: Some(&out),
            type_prefix: "Cms",
        })
        .unwrap();

        let written: PathRegistry =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        let uid = written.get(&["page".to_string(), "uid".to_string()]).unwrap();
        assert_eq!(uid.type_name, "String!");

        let rendered: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(rendered["custom_type_id"], "page");
        assert_eq!(rendered["type_paths"].as_array().unwrap().len(), written.len());
    }

    #[test]
    fn test_compile_rejects_invalid_type_prefix() {
        let dir = TempDir::new().unwrap();
        let schema = write_schema(&dir);
        let out = dir.path().join("paths.json");

        let err = run_compile(&CompileArgs {
            schema: &schema,
            custom_type_id: "page",
            format: OutputFormat::Sdl,
            out_paths: Some(&out),
            type_prefix: "my-prefix",
        })
        .unwrap_err();

        assert!(err.to_string().contains("type_prefix"));
        assert!(!out.exists());
    }

    #[test]
    fn test_compile_missing_schema_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        let err = run_compile(&CompileArgs {
            schema: &missing,
            custom_type_id: "page",
            format: OutputFormat::Sdl,
            out_paths: None,
            type_prefix: "Prismic",
        })
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to read schema"));
    }
}
