use axum::{extract::Path, response::Html, routing::get, Router};

use crate::types::{AppError, AppResult};

/// Pages reachable from the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    About,
    Guides,
    Support,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::About, Page::Guides, Page::Support];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::About => "About",
            Page::Guides => "Guides",
            Page::Support => "Support",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::About => "/about",
            Page::Guides => "/guides",
            Page::Support => "/support",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "about" => Some(Page::About),
            "guides" => Some(Page::Guides),
            "support" => Some(Page::Support),
            _ => None,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            Page::Home => HOME_BODY,
            Page::About => ABOUT_BODY,
            Page::Guides => GUIDES_BODY,
            Page::Support => SUPPORT_BODY,
        }
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(home))
        .route("/{page}", get(static_page))
}

async fn home() -> Html<String> {
    Html(render(Page::Home))
}

async fn static_page(Path(slug): Path<String>) -> AppResult<Html<String>> {
    let page = Page::from_slug(&slug).ok_or_else(|| AppError::NotFound(format!("page '{}'", slug)))?;
    Ok(Html(render(page)))
}

pub fn render(page: Page) -> String {
    let nav: String = Page::ALL
        .iter()
        .map(|p| {
            let class = if *p == page { " class=\"active\"" } else { "" };
            format!("<li><a href=\"{}\"{}>{}</a></li>", p.path(), class, p.title())
        })
        .collect();

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>RAGAData Chat - {title}</title>
  <style>
    body {{ font-family: Arial, sans-serif; margin: 0; color: #1d1d1f; display: flex; }}
    nav {{ width: 200px; min-height: 100vh; background: #f3f4f6; padding: 1.5rem 1rem; }}
    nav ul {{ list-style: none; padding: 0; }}
    nav a {{ display: block; padding: 0.4rem 0; color: #1d1d1f; text-decoration: none; }}
    nav a.active {{ font-weight: 700; color: #e8590c; }}
    main {{ flex: 1; padding: 2rem; max-width: 1100px; }}
    .card {{ border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }}
    label {{ display: block; margin-top: 0.75rem; font-weight: 600; }}
    input, select {{ width: 100%; padding: 0.5rem; }}
    button {{ margin-top: 1rem; padding: 0.6rem 1rem; }}
    pre {{ background: #f6f8fa; padding: 1rem; overflow: auto; }}
    table {{ border-collapse: collapse; }}
    td, th {{ border: 1px solid #ddd; padding: 0.3rem 0.6rem; }}
    .error {{ color: #c92a2a; }}
  </style>
</head>
<body>
  <nav>
    <h3>Navigation</h3>
    <ul>{nav}</ul>
  </nav>
  <main>
{body}
  </main>
</body>
</html>"#,
        title = page.title(),
        nav = nav,
        body = page.body(),
    )
}

const HOME_BODY: &str = r#"    <h1>Data Analysis, Visualization, and PDF Interaction</h1>

    <div class="card">
      <h2>Choose a file</h2>
      <input id="fileInput" type="file" accept=".csv,.xls,.xlsx,.pdf" />
      <button id="uploadBtn">Upload</button>
      <div id="uploadStatus"></div>
    </div>

    <div class="card">
      <h2>Data Preview</h2>
      <div id="preview">Upload a file to see a preview.</div>
    </div>

    <div class="card">
      <h2>Ask a Question</h2>
      <label for="question">Enter your question</label>
      <input id="question" value="What insights can you provide from the uploaded data?" />
      <button id="askBtn">Submit</button>
      <pre id="answer"></pre>
    </div>

    <div class="card">
      <h2>Data Visualization</h2>
      <div id="chartControls">Upload a CSV or XLSX file to create charts.</div>
      <div id="chart"></div>
      <pre id="insights"></pre>
    </div>

    <script>
      let sessionId = null;
      let numericColumns = [];

      const el = (id) => document.getElementById(id);
      const escapeHtml = (s) => String(s).replace(/[&<>"]/g, (c) => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;'}[c]));

      async function callApi(url, options) {
        const res = await fetch(url, options);
        const json = await res.json();
        if (!res.ok) throw new Error(json.message || res.statusText);
        return json;
      }

      function renderPreview(preview) {
        if (preview.kind === 'text') {
          el('preview').innerHTML = `<p>${preview.pages} page(s), ${preview.characters} characters</p><pre>${escapeHtml(preview.excerpt)}</pre>`;
          el('chartControls').innerHTML = '<p class="error">Please upload a valid CSV or XLSX file for visualization.</p>';
          return;
        }
        const head = preview.head;
        const rows = head.rows.map(r => `<tr>${r.map(c => `<td>${escapeHtml(c)}</td>`).join('')}</tr>`).join('');
        const types = preview.column_types.map(c => `${escapeHtml(c.name)}: ${c.dtype}`).join('\n');
        el('preview').innerHTML =
          `<table><tr>${head.columns.map(c => `<th>${escapeHtml(c)}</th>`).join('')}</tr>${rows}</table>` +
          `<p>Number of rows: ${preview.rows}<br/>Number of columns: ${preview.columns}</p>` +
          `<pre>${escapeHtml(types)}</pre><pre>${escapeHtml(preview.summary_text)}</pre>`;
        numericColumns = preview.numeric_columns;
        renderChartControls(preview.chart_kinds);
      }

      function renderChartControls(kinds) {
        if (numericColumns.length < 2) {
          el('chartControls').innerHTML = `<p class="error">The dataframe doesn't have enough numeric columns for plotting.</p>`;
          return;
        }
        const options = numericColumns.map(c => `<option>${escapeHtml(c)}</option>`).join('');
        el('chartControls').innerHTML =
          `<label>Select Plot Type</label><select id="kind">${kinds.map(k => `<option>${k}</option>`).join('')}</select>` +
          `<label>Select X-axis</label><select id="xCol">${options}</select>` +
          `<div id="yWrap"><label>Select Y-axis</label><select id="yCol">${options}</select></div>`;
        ['kind', 'xCol', 'yCol'].forEach(id => el(id).addEventListener('change', drawChart));
        drawChart();
      }

      async function drawChart() {
        const kind = el('kind').value;
        el('yWrap').style.display = kind === 'Histogram' ? 'none' : 'block';
        const payload = { kind, x: el('xCol').value, y: kind === 'Histogram' ? null : el('yCol').value };
        try {
          const json = await callApi(`/api/sessions/${sessionId}/chart`, {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify(payload)
          });
          el('chart').innerHTML = json.chart.svg || `<p>${escapeHtml(json.chart.title)}</p>`;
          el('insights').textContent = json.insights.notes.join('\n') + '\n\n' + JSON.stringify(
            { correlation: json.insights.correlation, x: json.insights.x_stats, y: json.insights.y_stats }, null, 2);
        } catch (err) {
          el('chart').innerHTML = `<p class="error">${escapeHtml(err.message)}</p>`;
          el('insights').textContent = '';
        }
      }

      el('uploadBtn').addEventListener('click', async () => {
        const fileInput = el('fileInput');
        if (!fileInput.files.length) {
          el('uploadStatus').textContent = 'Select a file first.';
          return;
        }
        const formData = new FormData();
        formData.append('file', fileInput.files[0]);
        if (sessionId) formData.append('session_id', sessionId);
        el('uploadStatus').textContent = 'Uploading...';
        try {
          const json = await callApi('/api/files', { method: 'POST', body: formData });
          sessionId = json.session_id;
          el('uploadStatus').textContent = `Loaded ${json.file_name}`;
          renderPreview(json.preview);
        } catch (err) {
          el('uploadStatus').innerHTML = `<span class="error">${escapeHtml(err.message)}</span>`;
        }
      });

      el('askBtn').addEventListener('click', async () => {
        el('answer').textContent = 'Thinking...';
        try {
          const json = await callApi('/api/chat', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ session_id: sessionId, question: el('question').value })
          });
          el('answer').textContent = 'Response:\n' + json.answer;
        } catch (err) {
          el('answer').textContent = err.message;
        }
      });
    </script>"#;

const ABOUT_BODY: &str = r#"    <h1>About RAGAData Chat</h1>
    <p>RAGAData Chat is a small tool for exploring your data. Upload a CSV, XLSX or PDF file,
    look at a preview and summary statistics, draw simple charts, and ask questions that a
    hosted language model answers using a summary of your file as context.</p>
    <p>Files stay in memory for the duration of your session and are never written to disk.</p>"#;

const GUIDES_BODY: &str = r#"    <h1>User Guides</h1>
    <p>Learn how to use RAGAData Chat effectively:</p>
    <ol>
      <li><strong>Uploading Data</strong>: pick a CSV, XLS/XLSX or PDF file on the Home page and press Upload.</li>
      <li><strong>Data Preview</strong>: tables show their first rows, column types and summary statistics; PDFs show an excerpt.</li>
      <li><strong>Asking Questions</strong>: type a question and press Submit. Tables are summarised with descriptive statistics and PDFs with their first 1000 characters.</li>
      <li><strong>Data Visualization</strong>: tables with at least two numeric columns can be drawn as scatter, line, bar or histogram charts.</li>
    </ol>"#;

const SUPPORT_BODY: &str = r#"    <h1>Support</h1>
    <p>Thank you for using RAGAData Chat!</p>
    <p>If the project helps you, star it on GitHub, report issues, or suggest features.
    Questions and feedback are always welcome.</p>"#;
