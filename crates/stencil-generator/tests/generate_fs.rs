//! End-to-end generation against the real filesystem.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use stencil_generator::{GenerateError, Generator, GeneratorConfig, Hooks, ItemEvent};
use stencil_render::Registry;
use stencil_storage::FsStorage;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn generator() -> Generator {
    Generator::new(Arc::new(FsStorage::new()), Arc::new(Registry::with_defaults()))
}

fn fixture(root: &Path) {
    write(root, "templates/_layout.jinja", "<title>{{ site }}</title>");
    write(
        root,
        "templates/index.jinja",
        "{% include \"layout\" %}<h1>{{ title }}</h1>",
    );
    write(root, "templates/feed.xml.jinja", "<feed>{{ title }}</feed>");
    write(
        root,
        "templates/docs/_layout.jinja",
        "<title>{{ site }} docs</title>",
    );
    write(
        root,
        "templates/docs/guide.jinja",
        "{% include \"layout\" %}{{ body }}{{ meta.author }}",
    );
    write(root, "templates/assets/site.css", "body { margin: 0 }");
    write(root, "content/shared.json", r#"{"site": "Example"}"#);
    write(root, "content/index.json", r#"{"title": "Welcome"}"#);
    write(root, "content/feed.json", r#"{"title": "News"}"#);
    write(root, "content/docs/guide/body.md", "Read **this**.");
    write(root, "content/docs/guide/meta.yaml", "author: Kim");
}

fn config(root: &Path) -> GeneratorConfig {
    GeneratorConfig::new(root.join("templates"), root.join("public"))
        .with_content_dir(root.join("content"))
        .with_shared_content("shared")
}

#[tokio::test]
async fn test_generates_tree_on_disk() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    fixture(root);

    let report = generator()
        .generate(config(root), Hooks::new())
        .await
        .unwrap();

    assert!(report.is_success(), "{:?}", report.events());
    assert_eq!((report.rendered, report.copied), (3, 1));

    let public = root.join("public");
    assert_eq!(
        fs::read_to_string(public.join("index.html")).unwrap(),
        "<title>Example</title><h1>Welcome</h1>"
    );
    assert_eq!(
        fs::read_to_string(public.join("feed.xml")).unwrap(),
        "<feed>News</feed>"
    );
    assert_eq!(
        fs::read_to_string(public.join("docs/guide.html")).unwrap(),
        "<title>Example docs</title><p>Read <strong>this</strong>.</p>\nKim"
    );
    assert_eq!(
        fs::read_to_string(public.join("assets/site.css")).unwrap(),
        "body { margin: 0 }"
    );
    assert!(!public.join("_layout.html").exists());
    assert!(!public.join("docs/_layout.html").exists());
}

#[tokio::test]
async fn test_regenerates_into_existing_output() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    fixture(root);
    let generator = generator();

    generator
        .generate(config(root), Hooks::new())
        .await
        .unwrap();
    write(root, "content/index.json", r#"{"title": "Updated"}"#);
    let report = generator
        .generate(config(root), Hooks::new())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(
        fs::read_to_string(root.join("public/index.html")).unwrap(),
        "<title>Example</title><h1>Updated</h1>"
    );
}

#[tokio::test]
async fn test_without_output_extension() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    write(root, "templates/CNAME.jinja", "example.org");

    generator()
        .generate(
            GeneratorConfig::new(root.join("templates"), root.join("public"))
                .with_output_extension(None),
            Hooks::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        fs::read_to_string(root.join("public/CNAME")).unwrap(),
        "example.org"
    );
}

#[tokio::test]
async fn test_render_failure_does_not_stop_run() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    write(root, "templates/ok.jinja", "fine");
    write(root, "templates/broken.jinja", "{% for %}");

    let report = generator()
        .generate(
            GeneratorConfig::new(root.join("templates"), root.join("public")),
            Hooks::new(),
        )
        .await
        .unwrap();

    assert_eq!((report.rendered, report.failures), (1, 1));
    assert!(matches!(
        report.events().iter().find(|e| e.is_failure()),
        Some(ItemEvent::Failed { source, .. }) if source.ends_with("broken.jinja")
    ));
    assert!(root.join("public/ok.html").exists());
}

#[tokio::test]
async fn test_missing_template_dir() {
    let temp = tempfile::tempdir().unwrap();

    let err = generator()
        .generate(
            GeneratorConfig::new(temp.path().join("nope"), temp.path().join("public")),
            Hooks::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::TemplateRoot(_)));
}
