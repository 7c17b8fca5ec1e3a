use cleanscan::scanner::{ScanConfig, Scanner};
use cleanscan::view::presets::{DatePreset, QuickFilter};
use cleanscan::view::{build_view, DateRange, ViewFilter};
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const DAY: i64 = 24 * 60 * 60;

fn names(view: &cleanscan::view::VisibleSet, root: &Path) -> Vec<String> {
    view.rows()
        .iter()
        .map(|r| {
            r.path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_search_term_pulls_in_ancestors_only() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a/b")).unwrap();
    fs::write(dir.path().join("a/report_final.pdf"), "r").unwrap();

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let view = build_view(&index, &ViewFilter::new().with_search_term("report"));

    assert_eq!(names(&view, index.root()), vec!["a", "a/report_final.pdf"]);
}

#[test]
fn test_extension_and_date_filters_combine() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("docs/2019")).unwrap();
    let old_pdf = dir.path().join("docs/2019/tax.pdf");
    let new_pdf = dir.path().join("docs/invoice.PDF");
    let new_txt = dir.path().join("docs/invoice.txt");
    for p in [&old_pdf, &new_pdf, &new_txt] {
        fs::write(p, "x").unwrap();
    }
    set_file_mtime(&old_pdf, FileTime::from_unix_time(1_560_000_000, 0)).unwrap();
    set_file_mtime(&new_pdf, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
    set_file_mtime(&new_txt, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();

    let pdfs = build_view(&index, &ViewFilter::new().with_extensions(["pdf"]));
    assert_eq!(pdfs.file_count(), 2);

    let recent = ViewFilter::new()
        .with_extensions([".pdf"])
        .with_date_range(DateRange::new(1_690_000_000, 1_710_000_000));
    let view = build_view(&index, &recent);
    assert_eq!(names(&view, index.root()), vec!["docs", "docs/invoice.PDF"]);
}

#[test]
fn test_quick_filter_and_date_preset() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("pics")).unwrap();
    let photo = dir.path().join("pics/cat.heic");
    let old_photo = dir.path().join("pics/dog.png");
    fs::write(&photo, "p").unwrap();
    fs::write(&old_photo, "p").unwrap();
    fs::write(dir.path().join("song.mp3"), "s").unwrap();

    let now = 1_700_000_000;
    set_file_mtime(&photo, FileTime::from_unix_time(now - 2 * DAY, 0)).unwrap();
    set_file_mtime(&old_photo, FileTime::from_unix_time(now - 400 * DAY, 0)).unwrap();

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();

    let images = ViewFilter::new().with_extensions(QuickFilter::Images.extensions());
    assert_eq!(build_view(&index, &images).file_count(), 2);

    let recent = images.clone().with_date_range(DatePreset::LastWeek.range(now));
    assert_eq!(
        build_view(&index, &recent).file_paths(),
        vec![index.root().join("pics/cat.heic")]
    );

    let stale = images.with_date_range(DatePreset::OlderThanYear.range(now));
    assert_eq!(
        build_view(&index, &stale).file_paths(),
        vec![index.root().join("pics/dog.png")]
    );
}

#[test]
fn test_every_visible_file_has_its_ancestors() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("x/y/z")).unwrap();
    fs::create_dir_all(dir.path().join("x/w")).unwrap();
    fs::write(dir.path().join("x/y/z/deep_match.txt"), "d").unwrap();
    fs::write(dir.path().join("x/w/other.txt"), "o").unwrap();

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let view = build_view(&index, &ViewFilter::new().with_search_term("match"));

    for row in view.rows().iter().filter(|r| !r.is_dir) {
        let mut parent = row.path.parent();
        while let Some(p) = parent {
            if p == index.root() {
                break;
            }
            assert!(view.contains(p), "{} missing", p.display());
            parent = p.parent();
        }
    }
    assert!(!view.contains(&index.root().join("x/w")));
    assert_eq!(view.len(), 4);
}

#[test]
fn test_no_filter_shows_the_whole_tree_in_order() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("B")).unwrap();
    fs::create_dir(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("B/inner.txt"), "i").unwrap();
    fs::write(dir.path().join("Zed.txt"), "z").unwrap();
    fs::write(dir.path().join("alpha.txt"), "a").unwrap();

    let index = Scanner::new(ScanConfig::default()).scan(dir.path()).unwrap();
    let view = build_view(&index, &ViewFilter::new());

    assert_eq!(
        names(&view, index.root()),
        vec!["a", "B", "B/inner.txt", "alpha.txt", "Zed.txt"]
    );
    let b_row = view.get(&index.root().join("B")).unwrap();
    let inner = view.get(&index.root().join("B/inner.txt")).unwrap();
    assert_eq!(inner.depth, 1);
    assert_eq!(view.rows()[inner.parent.unwrap()].path, b_row.path);
}
