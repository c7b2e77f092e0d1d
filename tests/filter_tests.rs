mod common;

use std::collections::BTreeSet;

use common::{catalog_of, three_record_catalog};
use fashion_explorer::filter::{self, DEFAULT_MIN_RATING};
use fashion_explorer::summary::NO_DATA;
use fashion_explorer::{
    Catalog, DashboardError, FilterSpec, FilteredView, PriceRange, Product, ProductId, summarize,
};

fn spec(categories: &[&str], min_rating: f64, price: (f64, f64), search: Option<&str>) -> FilterSpec {
    FilterSpec {
        categories: categories.iter().map(|c| c.to_string()).collect(),
        min_rating,
        price_range: PriceRange::new(price.0, price.1),
        search_text: search.map(str::to_string),
    }
}

#[test]
fn end_to_end_filter_and_summary() {
    let catalog = three_record_catalog();
    let view = filter::filter(&catalog, &spec(&["Tops"], 3.0, (100.0, 1000.0), Some("")));

    assert_eq!(view.ids(), vec![ProductId::from(1u32)]);
    let summary = summarize(&view);
    assert_eq!(summary.avg_price, Some(150.0));
    assert_eq!(summary.avg_rating, Some(4.0));
}

#[test]
fn end_to_end_rating_and_price_cut_within_selected_category() {
    let catalog = catalog_of(vec![
        Product::new(1u32, "Tops", 150.0, 4.0, "1.jpg"),
        Product::new(2u32, "Shoes", 1200.0, 3.5, "2.jpg"),
        Product::new(3u32, "Tops", 300.0, 2.0, "3.jpg"),
    ]);
    let view = filter::filter(&catalog, &spec(&["Tops"], 3.0, (100.0, 1000.0), Some("")));

    assert_eq!(view.ids(), vec![ProductId::from(1u32)]);
    let summary = summarize(&view);
    assert_eq!(summary.avg_price, Some(150.0));
    assert_eq!(summary.avg_rating, Some(4.0));
}

#[test]
fn every_record_satisfies_every_predicate() {
    let catalog = catalog_of(vec![
        Product::new(1u32, "Tops", 150.0, 4.0, "1.jpg"),
        Product::new(2u32, "Tops", 99.0, 5.0, "2.jpg"),
        Product::new(3u32, "Tops", 500.0, 2.9, "3.jpg"),
        Product::new(4u32, "Shoes", 200.0, 4.5, "4.jpg"),
        Product::new(5u32, "Dresses", 1000.0, 3.0, "5.jpg"),
        Product::new(6u32, "Dresses", 100.0, 3.0, "6.jpg"),
    ]);
    let spec = spec(&["Tops", "Dresses"], 3.0, (100.0, 1000.0), None);
    let view = filter::filter(&catalog, &spec);

    assert_eq!(
        view.ids(),
        vec![ProductId::from(1u32), ProductId::from(5u32), ProductId::from(6u32)]
    );
    for product in view.iter() {
        assert!(spec.categories.contains(&product.category));
        assert!(product.rating >= spec.min_rating);
        assert!(spec.price_range.contains(product.price));
    }
}

#[test]
fn search_matches_id_or_category() {
    let catalog = catalog_of(vec![
        Product::new(5u32, "Tops", 200.0, 4.0, "5.jpg"),
        Product::new(6u32, "Shoes5", 200.0, 4.0, "6.jpg"),
        Product::new(7u32, "Shoes", 200.0, 4.0, "7.jpg"),
    ]);
    let view = filter::filter(
        &catalog,
        &spec(&["Tops", "Shoes5", "Shoes"], 0.0, (0.0, 1000.0), Some("5")),
    );

    assert_eq!(view.ids(), vec![ProductId::from(5u32), ProductId::from(6u32)]);
}

#[test]
fn category_search_ignores_case_but_id_search_does_not() {
    let catalog = catalog_of(vec![
        Product::new("AB-1", "Tops", 200.0, 4.0, "a.jpg"),
        Product::new("ab-2", "Shoes", 200.0, 4.0, "b.jpg"),
    ]);
    let all = &["Tops", "Shoes"];

    let by_category = filter::filter(&catalog, &spec(all, 0.0, (0.0, 1000.0), Some("tOPs")));
    assert_eq!(by_category.ids(), vec![ProductId::from("AB-1")]);

    let by_id = filter::filter(&catalog, &spec(all, 0.0, (0.0, 1000.0), Some("AB")));
    assert_eq!(by_id.ids(), vec![ProductId::from("AB-1")]);
}

#[test]
fn empty_category_selection_matches_nothing() {
    let catalog = three_record_catalog();
    let view = filter::filter(&catalog, &spec(&[], 0.0, (0.0, 1000.0), None));
    assert!(view.is_empty());
}

#[test]
fn price_bounds_are_inclusive_and_reordered() {
    let catalog = three_record_catalog();
    let view = filter::filter(&catalog, &spec(&["Tops", "Shoes"], 0.0, (300.0, 150.0), None));
    assert_eq!(view.ids(), vec![ProductId::from(1u32), ProductId::from(3u32)]);
}

#[test]
fn defaults_select_the_first_category_only() {
    let catalog = three_record_catalog();
    let defaults = FilterSpec::defaults_for(&catalog);

    assert_eq!(defaults.categories, BTreeSet::from(["Tops".to_string()]));
    assert_eq!(defaults.min_rating, DEFAULT_MIN_RATING);
    assert_eq!(defaults.price_range, PriceRange::new(100.0, 1000.0));
    assert_eq!(defaults.search_text, None);
}

#[test]
fn filtering_keeps_catalog_order() {
    let catalog = catalog_of(vec![
        Product::new(9u32, "Tops", 200.0, 4.0, "9.jpg"),
        Product::new(2u32, "Tops", 300.0, 4.0, "2.jpg"),
        Product::new(5u32, "Tops", 400.0, 4.0, "5.jpg"),
    ]);
    let view = filter::filter(&catalog, &FilterSpec::defaults_for(&catalog));
    assert_eq!(
        view.ids(),
        vec![ProductId::from(9u32), ProductId::from(2u32), ProductId::from(5u32)]
    );
}

#[test]
fn summary_averages_prices() {
    let view = FilteredView::new(vec![
        Product::new(1u32, "Tops", 100.0, 3.0, "1.jpg"),
        Product::new(2u32, "Tops", 200.0, 4.0, "2.jpg"),
        Product::new(3u32, "Tops", 300.0, 5.0, "3.jpg"),
    ]);
    let summary = summarize(&view);

    assert_eq!(summary.avg_price, Some(200.0));
    assert_eq!(summary.avg_rating, Some(4.0));
    assert_eq!(summary.price_label(), "₹ 200.00");
    assert_eq!(summary.rating_label(), "4.00 ⭐");
}

#[test]
fn summary_of_empty_view_is_no_data() {
    let summary = summarize(&FilteredView::default());

    assert_eq!(summary.avg_price, None);
    assert_eq!(summary.avg_rating, None);
    assert_eq!(summary.price_label(), NO_DATA);
    assert_eq!(summary.rating_label(), NO_DATA);
}

#[test]
fn catalog_columns_are_found_by_name() {
    let catalog = Catalog::parse(
        "rating,image_name,extra,category,price,product_id\n\
         4.5,a.jpg,x,Tops,120,A1\n\
         \n\
         3.0,\"b, c.jpg\",y,Shoes,80,B2\n",
    )
    .unwrap();

    assert_eq!(catalog.len(), 2);
    let b2 = catalog.get(&ProductId::from("B2")).unwrap();
    assert_eq!(b2.image_name, "b, c.jpg");
    assert_eq!(b2.price, 80.0);
    assert_eq!(catalog.categories(), vec!["Tops".to_string(), "Shoes".to_string()]);
    assert_eq!(catalog.price_bounds(), Some((80.0, 120.0)));
}

#[test]
fn catalog_rejects_bad_rows() {
    let cases = [
        ("product_id,category,price,rating\n", 1),
        ("product_id,category,price,rating,image_name\n1,Tops,abc,4,1.jpg\n", 2),
        ("product_id,category,price,rating,image_name\n1,Tops,10,6,1.jpg\n", 2),
        ("product_id,category,price,rating,image_name\n1,Tops,10,4,1.jpg\n1,Shoes,20,3,2.jpg\n", 3),
        ("product_id,category,price,rating,image_name\n1,Tops\n", 2),
    ];

    for (text, expected_line) in cases {
        match Catalog::parse(text) {
            Err(DashboardError::Catalog { line, .. }) => assert_eq!(line, expected_line, "{}", text),
            other => panic!("expected a catalog error for {:?}, got {:?}", text, other),
        }
    }
}

#[test]
fn catalog_file_round_trips_through_csv_export() {
    let fixture = common::Fixture::new(common::THREE_RECORDS, &[]);
    let catalog = Catalog::from_csv(fixture.catalog_path()).unwrap();
    let exported = fashion_explorer::downloader::to_csv(catalog.products());

    assert_eq!(Catalog::parse(&exported).unwrap().products(), catalog.products());
}
