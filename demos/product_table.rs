/// Product Table Example
///
/// This example demonstrates:
/// - Building a view over the sample product catalogue
/// - Searching, filtering by region and price
/// - Sorting and paging through the results
/// - Moving tasks between board columns

use datagrid::{sample, Board, Filter, QueryUpdate, SortDirection, ViewController, ViewResult};
use std::rc::Rc;

fn print_page(result: &ViewResult) {
    if result.is_empty {
        println!("   (no products match)");
        return;
    }
    for row in &result.rows {
        println!(
            "      {:<22} {:<10} {:>8}",
            row.get("product").map(|v| v.to_string()).unwrap_or_default(),
            row.get("region").map(|v| v.to_string()).unwrap_or_default(),
            row.get("price").map(|v| v.to_string()).unwrap_or_default(),
        );
    }
    println!(
        "   page {} of {} ({} of {} products)\n",
        result.page + 1,
        result.page_count,
        result.total_count,
        result.source_count
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== DataGrid Product Table Example ===\n");

    let store = Rc::new(sample::catalogue(24)?);
    let mut view = ViewController::new(store, sample::product_config().with_page_size(5))?;

    println!("1. Initial view");
    print_page(&view.current()?);

    println!("2. Searching for \"desk\"");
    print_page(&view.on_query_change(QueryUpdate::search("desk"))?);

    println!("3. Asia only, cheapest first");
    let result = view.on_query_change(
        QueryUpdate::search("")
            .with_filter("region", Filter::category("asia"))
            .with_sort("price", SortDirection::Ascending),
    )?;
    print_page(&result);

    println!("4. Next page");
    print_page(&view.next_page()?);

    println!("5. Price between 40 and 60");
    let update = QueryUpdate::filter("price", Filter::range(Some(40.0), Some(60.0)));
    print_page(&view.on_query_change(update)?);

    println!("6. Nothing matches");
    print_page(&view.on_query_change(QueryUpdate::search("NonExistentProductXYZ123"))?);

    println!("7. Board moves");
    let mut board = Board::with_columns(["backlog", "in progress", "shipped"])?;
    for task in ["restock mice", "photograph desks", "price review"] {
        board.add_task(task, "backlog")?;
    }
    board.move_task("restock mice", "in progress")?;
    board.move_task("restock mice", "shipped")?;
    for (column, count) in board.counts() {
        println!("      {:<12} {}", column, count);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
