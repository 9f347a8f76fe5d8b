//! HTML for the survey form and the short status pages.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::fmt::Write;
use survey_core::form::{choice_field, reason_field, EXPERIENCE_FIELD, SKILL_FIELD};
use survey_core::model::{ImagePair, ReasonTag, SkillLevel};

/// Characters escaped in an image path; `/` is kept so nested names work.
const IMAGE_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Code Refactoring Survey</title>
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css" rel="stylesheet">
    <style>
        .pair-block { margin-bottom: 40px; }
        img { max-width: 100%; height: auto; border: 1px solid #ccc; margin-bottom: 10px; }
        .subtitle { font-size: 0.95rem; color: #666; margin-bottom: 15px; }
    </style>
</head>
<body class="container py-4">
"#;

const FOOT: &str = "</body>\n</html>\n";

pub const THANK_YOU: &str = "You've already submitted. Thank you!";

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn image_url(name: &str) -> String {
    format!("/images/{}", utf8_percent_encode(name, IMAGE_PATH))
}

pub fn thank_you_page() -> String {
    message_page("Thank you", THANK_YOU)
}

pub fn message_page(title: &str, message: &str) -> String {
    format!(
        "{HEAD}    <h2>{}</h2>\n    <p>{}</p>\n{FOOT}",
        escape_html(title),
        escape_html(message)
    )
}

pub fn survey_form(pairs: &[ImagePair]) -> String {
    let mut html = String::from(HEAD);
    html.push_str(
        r#"    <h1 class="mb-2">Code Refactoring Preference Survey</h1>
    <p>This survey is part of a research study on how people perceive automatically refactored Python code. We are investigating how readability, maintainability, and complexity influence code preferences.</p>
    <p>Your participation is anonymous. Your feedback will contribute to understanding the effectiveness of LLMs as refactoring tools.</p>
"#,
    );
    let _ = writeln!(
        html,
        "    <p><strong>Instructions:</strong> You'll see {} pairs of Python code snippets. For each pair, select the version you prefer.</p>\n    <hr>",
        pairs.len()
    );

    html.push_str("    <form method=\"post\">\n");
    let _ = writeln!(
        html,
        r#"    <div class="mb-3">
      <label for="{EXPERIENCE_FIELD}" class="form-label"><strong>How many years of experience do you have with programming?</strong></label>
      <input type="number" class="form-control" name="{EXPERIENCE_FIELD}" id="{EXPERIENCE_FIELD}" min="0" max="50" required>
    </div>
    <div class="mb-4">
      <label for="{SKILL_FIELD}" class="form-label"><strong>How familiar are you with Python?</strong></label>
      <select class="form-select" name="{SKILL_FIELD}" id="{SKILL_FIELD}" required>
        <option value="">Select...</option>"#
    );
    for level in SkillLevel::ALL {
        let _ = writeln!(
            html,
            "        <option value=\"{}\">{}</option>",
            level.as_str(),
            level.label()
        );
    }
    html.push_str("      </select>\n    </div>\n");

    for (i, pair) in pairs.iter().enumerate() {
        write_pair(&mut html, i, pair);
    }

    html.push_str("    <button type=\"submit\" class=\"btn btn-primary\">Submit</button>\n    </form>\n");
    html.push_str(FOOT);
    html
}

fn write_pair(html: &mut String, i: usize, pair: &ImagePair) {
    let choice = choice_field(i);
    let reason = reason_field(i);
    let _ = writeln!(
        html,
        r#"    <div class="pair-block">
      <h5>Pair {n}</h5>
      <p class="subtitle">Please choose the option you prefer.</p>
      <div class="mb-2">
        <label class="form-label">Option A</label><br>
        <img src="{a}" alt="Option A">
      </div>
      <div class="mb-2">
        <label class="form-label">Option B</label><br>
        <img src="{b}" alt="Option B">
      </div>
      <div class="form-check mt-2">
        <input class="form-check-input" type="radio" name="{choice}" value="A" required>
        <label class="form-check-label">Prefer A</label>
      </div>
      <div class="form-check mb-4">
        <input class="form-check-input" type="radio" name="{choice}" value="B" required>
        <label class="form-check-label">Prefer B</label>
      </div>
      <div class="mt-2">
        <p><strong>Why?</strong> (Select all that apply)</p>"#,
        n = i + 1,
        a = escape_html(&image_url(&pair.image_a)),
        b = escape_html(&image_url(&pair.image_b)),
    );
    for tag in ReasonTag::ALL {
        let _ = writeln!(
            html,
            r#"        <div class="form-check">
          <input class="form-check-input" type="checkbox" name="{reason}" value="{}">
          <label class="form-check-label">{}</label>
        </div>"#,
            tag.as_str(),
            tag.label()
        );
    }
    html.push_str("      </div>\n    </div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a: &str, b: &str) -> ImagePair {
        ImagePair {
            image_a: a.to_string(),
            image_b: b.to_string(),
        }
    }

    #[test]
    fn form_binds_one_block_per_pair() {
        let html = survey_form(&[pair("o1.png", "r1.png"), pair("r2.png", "o2.png")]);
        assert_eq!(html.matches("class=\"pair-block\"").count(), 2);
        assert!(html.contains("name=\"pair_0\" value=\"A\""));
        assert!(html.contains("name=\"pair_1\" value=\"B\""));
        assert!(html.contains("name=\"reason_1[]\" value=\"maintainable\""));
        assert!(html.contains("src=\"/images/r2.png\""));
        assert!(html.contains("You'll see 2 pairs"));
    }

    #[test]
    fn image_names_are_encoded_and_escaped() {
        assert_eq!(image_url("dir/a b.png"), "/images/dir/a%20b.png");
        let html = survey_form(&[pair("x\"onerror=\"1.png", "y.png")]);
        assert!(!html.contains("x\"onerror"));
    }

    #[test]
    fn message_page_escapes_text() {
        let html = message_page("Error", "<script>");
        assert!(html.contains("&lt;script&gt;"));
    }
}
