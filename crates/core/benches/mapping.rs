use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mapscrape_core::{Backend, FetchConfig, QueryContext, ScraperConfig, StaticFetcher};

fn load_example() -> ScraperConfig {
    ScraperConfig::from_file("../../tests/fixtures/scrapers/example.json").unwrap()
}

fn bench_wrap(c: &mut Criterion) {
    let json = std::fs::read_to_string("../../tests/fixtures/docs/scene.json").unwrap();
    let jsonp = std::fs::read_to_string("../../tests/fixtures/docs/gallery_abc123.jsonp").unwrap();
    let html = std::fs::read_to_string("../../tests/fixtures/pages/scene.html").unwrap();

    let fetcher = StaticFetcher::new();
    let fetch_config = FetchConfig::default();
    let ctx = QueryContext::new(&fetcher, &fetch_config);

    let mut group = c.benchmark_group("wrap");

    group.bench_with_input(BenchmarkId::new("json", "scene"), &json, |b, doc| {
        b.iter(|| Backend::Json.wrap(black_box(doc), "scene.json", ctx))
    });

    group.bench_with_input(BenchmarkId::new("jsonp", "gallery"), &jsonp, |b, doc| {
        b.iter(|| Backend::Json.wrap(black_box(doc), "gallery.jsonp", ctx))
    });

    group.bench_with_input(BenchmarkId::new("html", "scene"), &html, |b, doc| {
        b.iter(|| Backend::Html.wrap(black_box(doc), "scene.html", ctx))
    });

    group.finish();
}

fn bench_scene_mapping(c: &mut Criterion) {
    let config = load_example();
    let json = std::fs::read_to_string("../../tests/fixtures/docs/scene.json").unwrap();
    let html = std::fs::read_to_string("../../tests/fixtures/pages/scene.html").unwrap();

    // sub-scrapes miss and fall through, keeping the benchmark off the filesystem
    let fetcher = StaticFetcher::new();
    let fetch_config = FetchConfig::default();
    let ctx = QueryContext::new(&fetcher, &fetch_config);

    let api = &config.json_scrapers["api"];
    let page = &config.html_scrapers["page"];
    let json_query = Backend::Json.wrap(&json, "scene.json", ctx).unwrap();
    let html_query = Backend::Html.wrap(&html, "scene.html", ctx).unwrap();

    let mut group = c.benchmark_group("scene_mapping");

    group.bench_function("json", |b| {
        b.iter(|| api.scene.as_ref().unwrap().scrape(black_box(json_query.as_ref()), &api.common))
    });

    group.bench_function("html", |b| {
        b.iter(|| page.scene.as_ref().unwrap().scrape(black_box(html_query.as_ref()), &page.common))
    });

    group.finish();
}

criterion_group!(benches, bench_wrap, bench_scene_mapping);
criterion_main!(benches);
