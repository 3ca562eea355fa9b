use odbc_cursor::CellStore;
use proptest::prelude::*;

fn cell_text(row: usize, col: usize) -> Vec<u8> {
    format!("r{}c{}", row, col).into_bytes()
}

proptest! {
    #[test]
    fn write_then_read_returns_text(
        rows in 1usize..20,
        cols in 1usize..10,
        text in prop::collection::vec(any::<u8>(), 0..64),
        pick in any::<(usize, usize)>(),
    ) {
        let mut store = CellStore::new();
        store.resize(rows, cols);
        let (r, c) = (pick.0 % rows, pick.1 % cols);
        store.write(r, c, &text).unwrap();
        let (read, null) = store.read(r, c).unwrap();
        prop_assert_eq!(read, &text[..]);
        prop_assert!(!null);
    }

    #[test]
    fn growing_resize_preserves_cells(
        rows in 1usize..12,
        cols in 1usize..8,
        extra_rows in 0usize..6,
        extra_cols in 0usize..6,
    ) {
        let mut store = CellStore::new();
        store.resize(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                store.write(r, c, &cell_text(r, c)).unwrap();
            }
        }
        let len = store.resize(rows + extra_rows, cols + extra_cols);
        prop_assert_eq!(len, (rows + extra_rows) * (cols + extra_cols));
        for r in 0..rows {
            for c in 0..cols {
                let value = store.value(r, c).unwrap();
                prop_assert_eq!(value, Some(&cell_text(r, c)[..]));
            }
        }
        for c in cols..cols + extra_cols {
            prop_assert_eq!(store.value(0, c).unwrap(), None);
        }
    }

    #[test]
    fn out_of_range_access_fails(rows in 1usize..10, cols in 1usize..10) {
        let mut store = CellStore::new();
        store.resize(rows, cols);
        prop_assert!(store.write(rows, 0, b"x").is_err());
        prop_assert!(store.write(0, cols, b"x").is_err());
        prop_assert!(store.read(rows, cols).is_err());
    }
}

#[test]
fn test_producer_fills_rows_in_order() {
    let mut store = CellStore::with_columns(2);
    for r in 0..5 {
        assert!(store.advance_row());
        store.write_current(0, &cell_text(r, 0)).unwrap();
        store.write_current_null(1).unwrap();
    }
    assert_eq!(store.row_count(), 5);
    let row = store.row(3).unwrap();
    assert_eq!(row.to_owned_values(), vec![Some(cell_text(3, 0)), None]);
}
