use std::path::Path;

use base64::Engine as _;

use crate::document::{ExtractedImage, RenderContext};
use crate::formats::{NotebookCell, NotebookDocument, NotebookOutput};
use crate::markdown::{escape_html, render_markdown};

pub const NOTEBOOK_EXCERPT: &str = "Jupyter notebook";

#[derive(Debug, thiserror::Error)]
pub enum NotebookError {
    #[error("malformed notebook json: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("unexpected notebook structure: {0}")]
    InvalidShape(#[source] serde_json::Error),
    #[error("notebook has no `cells` array")]
    MissingCells,
}

#[derive(Debug, Clone)]
pub struct Notebook {
    pub cells: Vec<NotebookCell>,
    pub language: String,
}

pub fn parse_notebook(source: &str) -> Result<Notebook, NotebookError> {
    let value: serde_json::Value = serde_json::from_str(source).map_err(NotebookError::Malformed)?;
    let document: NotebookDocument =
        serde_json::from_value(value).map_err(NotebookError::InvalidShape)?;
    let cells = document.cells.ok_or(NotebookError::MissingCells)?;
    let language = document
        .metadata
        .kernelspec
        .and_then(|spec| spec.language)
        .unwrap_or_else(|| "python".to_owned());

    Ok(Notebook { cells, language })
}

/// Title from the first markdown cell whose first source line is a `# ` heading.
pub fn extract_title(source: &str) -> Option<String> {
    let notebook = parse_notebook(source).ok()?;
    notebook
        .cells
        .iter()
        .filter(|cell| cell.cell_type == "markdown")
        .filter_map(|cell| cell.source.first_entry())
        .filter_map(|first| first.lines().next())
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim_end)
        .filter(|title| !title.is_empty())
        .map(str::to_owned)
}

pub fn render_notebook(source: &str, ctx: &RenderContext<'_>) -> (String, Vec<ExtractedImage>) {
    let notebook = match parse_notebook(source) {
        Ok(notebook) => notebook,
        Err(err) => {
            tracing::warn!(%err, stem = ctx.asset_stem, "notebook could not be parsed");
            return (
                format!(
                    "<div class=\"error\">Error parsing notebook: {}</div>",
                    escape_html(&err.to_string())
                ),
                Vec::new(),
            );
        }
    };

    let mut images = Vec::new();
    let mut html = String::new();
    html.push_str("<div class=\"jupyter-notebook\">\n");

    for (idx, cell) in notebook.cells.iter().enumerate() {
        let cell_number = idx + 1;
        match cell.cell_type.as_str() {
            "markdown" => {
                html.push_str("  <div class=\"nb-cell nb-markdown-cell\">\n");
                html.push_str(&format!("    {}\n", render_markdown(&cell.source.joined())));
                html.push_str("  </div>\n");
            }
            "code" => {
                html.push_str(&render_code_cell(cell, &notebook.language));
                for (out_idx, output) in cell.outputs.iter().enumerate() {
                    let output_number = out_idx + 1;
                    let location = OutputLocation {
                        execution_count: cell.execution_count.unwrap_or(0),
                        cell_number,
                        output_number,
                    };
                    html.push_str(&render_output(output, &location, ctx, &mut images));
                }
                html.push_str("  </div>\n");
            }
            _ => {}
        }
    }

    html.push_str("</div>\n");
    (html, images)
}

struct OutputLocation {
    execution_count: u64,
    cell_number: usize,
    output_number: usize,
}

fn render_code_cell(cell: &NotebookCell, language: &str) -> String {
    let mut html = String::new();
    html.push_str("  <div class=\"nb-cell nb-code-cell\">\n");
    html.push_str("    <div class=\"nb-input\">\n");
    match cell.execution_count {
        Some(count) if count > 0 => {
            html.push_str(&format!("      <div class=\"nb-input-prompt\">In [{count}]:</div>\n"));
        }
        _ => html.push_str("      <div class=\"nb-input-prompt\">In [ ]:</div>\n"),
    }
    html.push_str(&format!(
        "      <pre><code class=\"{}\">{}</code></pre>\n",
        prism_language_class(language),
        escape_html(&cell.source.joined())
    ));
    html.push_str("    </div>\n");
    html
}

fn render_output(
    raw: &serde_json::Value,
    location: &OutputLocation,
    ctx: &RenderContext<'_>,
    images: &mut Vec<ExtractedImage>,
) -> String {
    let output: NotebookOutput = match serde_json::from_value(raw.clone()) {
        Ok(output) => output,
        Err(err) => {
            return format!(
                "    <div class=\"nb-output-error\">Error parsing output: {}</div>\n",
                escape_html(&err.to_string())
            );
        }
    };

    let mut html = String::new();
    match output.output_type.as_str() {
        "stream" => {
            html.push_str("    <div class=\"nb-output\">\n");
            if location.execution_count > 0 {
                html.push_str("      <div class=\"nb-output-prompt\"></div>\n");
            }
            if let Some(text) = &output.text {
                html.push_str(&format!("      <pre>{}</pre>\n", escape_html(&text.joined())));
            }
            html.push_str("    </div>\n");
        }
        "display_data" | "execute_result" => {
            html.push_str("    <div class=\"nb-output\">\n");
            if output.output_type == "execute_result" && location.execution_count > 0 {
                html.push_str(&format!(
                    "      <div class=\"nb-output-prompt\">Out[{}]:</div>\n",
                    location.execution_count
                ));
            }
            html.push_str(&render_display_data(&output, location, ctx, images));
            html.push_str("    </div>\n");
        }
        "error" => {
            html.push_str("    <div class=\"nb-output\">\n");
            html.push_str(&render_error_output(&output));
            html.push_str("    </div>\n");
        }
        _ => {}
    }
    html
}

fn render_display_data(
    output: &NotebookOutput,
    location: &OutputLocation,
    ctx: &RenderContext<'_>,
    images: &mut Vec<ExtractedImage>,
) -> String {
    let data = &output.data;
    if let Some(png) = data.get("image/png") {
        format!("      {}\n", extract_image(png, "png", location, ctx, images))
    } else if let Some(svg) = data.get("image/svg+xml") {
        format!("      {}\n", join_value(svg))
    } else if let Some(jpeg) = data.get("image/jpeg") {
        format!("      {}\n", extract_image(jpeg, "jpg", location, ctx, images))
    } else if let Some(markup) = data.get("text/html") {
        format!(
            "      <div class=\"nb-html-output\">{}</div>\n",
            join_value(markup)
        )
    } else if let Some(text) = data.get("text/plain") {
        format!("      <pre>{}</pre>\n", escape_html(&join_value(text)))
    } else {
        String::new()
    }
}

fn render_error_output(output: &NotebookOutput) -> String {
    let (Some(ename), Some(evalue)) = (&output.ename, &output.evalue) else {
        return String::new();
    };

    let mut html = String::new();
    html.push_str("      <div class=\"nb-output-error\">");
    html.push_str(&format!(
        "<strong>{}:</strong> {}",
        escape_html(ename),
        escape_html(evalue)
    ));
    if !output.traceback.is_empty() {
        html.push_str("\n\n");
        for line in &output.traceback {
            html.push_str(&escape_html(&strip_ansi_codes(line)));
            html.push('\n');
        }
    }
    html.push_str("</div>\n");
    html
}

fn extract_image(
    encoded: &serde_json::Value,
    extension: &str,
    location: &OutputLocation,
    ctx: &RenderContext<'_>,
    images: &mut Vec<ExtractedImage>,
) -> String {
    let encoded: String = join_value(encoded)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(err) => {
            return format!(
                "<div class=\"error\">Error extracting image: {}</div>",
                escape_html(&err.to_string())
            );
        }
    };

    let file_name = format!(
        "{}_cell{}_out{}.{extension}",
        ctx.asset_stem, location.cell_number, location.output_number
    );
    let src = format!(
        "{}images/notebooks/{file_name}",
        "../".repeat(ctx.depth)
    );
    images.push(ExtractedImage { file_name, bytes });

    format!(
        "<img src=\"{src}\" alt=\"Output {}\" />",
        location.output_number
    )
}

fn join_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Array(items) => items.iter().filter_map(|item| item.as_str()).collect(),
        _ => String::new(),
    }
}

fn prism_language_class(language: &str) -> &'static str {
    match language {
        "r" | "R" => "language-r",
        "julia" => "language-julia",
        "bash" | "shell" => "language-bash",
        _ => "language-python",
    }
}

/// Removes SGR escape sequences (`ESC [ ... m`) that kernels put in tracebacks.
fn strip_ansi_codes(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find("\x1b[") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let params = after
            .find(|c: char| !(c.is_ascii_digit() || c == ';'))
            .unwrap_or(after.len());
        if after[params..].starts_with('m') {
            rest = &after[params + 1..];
        } else {
            out.push_str("\x1b[");
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

pub fn title_or_stem(source: &str, path: &Path) -> String {
    extract_title(source).unwrap_or_else(|| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}
