/// Renders the control panel with the subject dropdown filled in.
pub fn render_page(subjects: &[String]) -> String {
    let options: String = subjects
        .iter()
        .map(|s| format!("<option value=\"{0}\">{0}</option>", escape(s)))
        .collect::<Vec<_>>()
        .join("\n          ");
    PAGE.replace("{{SUBJECT_OPTIONS}}", &options)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const PAGE: &str = r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>voxprep</title>
  <style>
    body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }
    .tabs button { padding: .5rem 1rem; }
    .tabs button.active { font-weight: bold; }
    section { display: none; margin-top: 1rem; }
    section.active { display: block; }
    label { display: block; margin: .5rem 0; }
    output { display: block; margin-top: 1rem; white-space: pre-wrap; }
  </style>
</head>
<body>
  <nav class="tabs">
    <button data-tab="train" class="active">Welcome page</button>
    <button data-tab="infer">Visualization page</button>
  </nav>

  <section id="train" class="active">
    <form id="train-form">
      <label>Subject <input name="subject" required></label>
      <label>Video link <input name="url" required></label>
      <button type="submit">Train</button>
    </form>
    <output id="train-status"></output>
  </section>

  <section id="infer">
    <form id="infer-form">
      <label>Subject
        <select name="subject">
          {{SUBJECT_OPTIONS}}
        </select>
      </label>
      <label>Files <input type="file" name="files" multiple></label>
      <button type="submit">Infer</button>
    </form>
    <output id="infer-status"></output>
  </section>

  <script>
    document.querySelectorAll('.tabs button').forEach(button => {
      button.addEventListener('click', () => {
        document.querySelectorAll('.tabs button, section').forEach(el => el.classList.remove('active'));
        button.classList.add('active');
        document.getElementById(button.dataset.tab).classList.add('active');
      });
    });

    async function submit(form, status, body) {
      status.textContent = 'Running...';
      const response = await fetch(form.id === 'train-form' ? '/train' : '/infer', { method: 'POST', body });
      const payload = await response.json();
      status.textContent = response.ok ? payload.status : payload.error + (payload.details ? '\n' + payload.details : '');
    }

    document.getElementById('train-form').addEventListener('submit', event => {
      event.preventDefault();
      const form = event.target;
      submit(form, document.getElementById('train-status'), new URLSearchParams(new FormData(form)));
    });

    document.getElementById('infer-form').addEventListener('submit', event => {
      event.preventDefault();
      const form = event.target;
      submit(form, document.getElementById('infer-status'), new FormData(form));
    });
  </script>
</body>
</html>
"#;
