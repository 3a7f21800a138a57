use html_minifier::HTMLMinifier;
use tera::Context;
use thiserror::Error;
use tide::log::error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("rendering error")]
    Tera(#[from] tera::Error),
}

pub(super) fn render(
    tera: &tera::Tera,
    template: &'static str,
    context: &Context,
) -> Result<String, TemplateError> {
    let rendered = tera.render(template, context)?;

    let mut html_minifier = HTMLMinifier::new();
    if let Err(err) = html_minifier.digest(&rendered) {
        error!("Failed to minify HTML: {}", err);
        return Ok(rendered);
    };

    let minified = match std::str::from_utf8(html_minifier.get_html()) {
        Ok(minified) => minified.to_string(),
        Err(err) => {
            error!("Failed to parse minified HTML as UTF-8: {}", err);
            rendered
        },
    };

    Ok(minified)
}

#[cfg(test)]
mod tests {
    use photoshare_api_structs::DisplayPhoto;

    use super::*;

    #[test]
    fn rendered_gallery_contains_photo_urls() {
        let mut tera = tera::Tera::default();
        tera.add_raw_template(
            "gallery.html",
            "<html><body><h1>{{ title }}</h1>{% for photo in photos %}<img src=\"{{ photo.url }}\">{% endfor %}</body></html>",
        )
        .unwrap();

        let mut context = Context::new();
        context.insert("title", "holiday");
        context.insert(
            "photos",
            &vec![DisplayPhoto {
                url: "http://localhost/api/files/photos/1/a.jpg".to_string(),
                width: Some(500),
                height: Some(500),
            }],
        );

        let html = render(&tera, "gallery.html", &context).unwrap();
        assert!(html.contains("holiday"));
        assert!(html.contains("http://localhost/api/files/photos/1/a.jpg"));
    }

    #[test]
    fn missing_template_is_an_error() {
        let tera = tera::Tera::default();
        assert!(render(&tera, "gallery.html", &Context::new()).is_err());
    }
}
