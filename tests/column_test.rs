/*!
 * Column Container Tests
 * Construction, slicing, filtering, gathering, and ownership contracts
 */

use quiver_kernel::{Column, CmpOp, DType};

#[test]
fn test_construction_round_trip() {
    let data = [1.5f64, -2.5, 3.25];
    let col = Column::from_slice(&data).unwrap();
    assert_eq!(col.len(), 3);
    assert_eq!(col.values::<f64>().unwrap(), &data);
    assert_eq!(col.null_count(), 0);
}

#[test]
fn test_filter_length_equals_popcount() {
    let data: Vec<i64> = (0..100).collect();
    let col = Column::from_slice(&data).unwrap();
    let mask_bytes: Vec<u8> = (0..100).map(|i| u8::from(i % 7 == 0)).collect();
    let expected = mask_bytes.iter().filter(|&&m| m != 0).count();
    let mask = Column::from_mask(mask_bytes);

    let out = col.filter(&mask).unwrap();
    assert_eq!(out.len(), expected);
    // Ordering preserved
    let vals = out.values::<i64>().unwrap();
    assert!(vals.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_filter_all_true_is_value_equivalent() {
    let data = [3.5f64, 1.0, 9.0];
    let col = Column::from_slice(&data).unwrap();
    let mask = Column::from_mask(vec![1; 3]);
    let out = col.filter(&mask).unwrap();
    assert_eq!(out.values::<f64>().unwrap(), &data);
    assert_ne!(out.data_ptr(), col.data_ptr());
}

#[test]
fn test_gather_contract() {
    let col = Column::from_slice(&[10.0f64, 20.0, 30.0]).unwrap();
    let out = col.gather(&[2, 0, -1, 1, 99]).unwrap();
    assert_eq!(out.len(), 5);
    assert_eq!(out.get::<f64>(0), Some(30.0));
    assert_eq!(out.get::<f64>(1), Some(10.0));
    assert_eq!(out.get::<f64>(2), None);
    assert_eq!(out.get::<f64>(3), Some(20.0));
    // Out-of-range is null, not an error
    assert_eq!(out.get::<f64>(4), None);
    assert_eq!(out.null_count(), 2);
}

#[test]
fn test_slice_bitmap_realignment() {
    let data: Vec<f64> = (0..64).map(f64::from).collect();
    let mut bitmap = vec![0xFFu8; 8];
    bitmap[1] = 0b1111_0111; // element 11 null
    let col = Column::with_nulls(&data, &bitmap).unwrap();

    let sliced = col.slice(9, 20).unwrap();
    assert_eq!(sliced.len(), 11);
    assert_eq!(sliced.null_count(), 1);
    assert_eq!(sliced.get::<f64>(2), None);
    assert_eq!(sliced.get::<f64>(3), Some(12.0));
}

#[test]
fn test_arithmetic_elementwise_contract() {
    let a = Column::from_slice(&[1.0f64, 2.0, 3.0]).unwrap();
    let b = Column::from_slice(&[0.5f64, 4.0, -3.0]).unwrap();

    let add = a.add(&b).unwrap();
    let sub = a.sub(&b).unwrap();
    let mul = a.mul(&b).unwrap();
    let div = a.div(&b).unwrap();
    for i in 0..3 {
        let (x, y) = (a.get::<f64>(i).unwrap(), b.get::<f64>(i).unwrap());
        assert_eq!(add.get::<f64>(i), Some(x + y));
        assert_eq!(sub.get::<f64>(i), Some(x - y));
        assert_eq!(mul.get::<f64>(i), Some(x * y));
        assert_eq!(div.get::<f64>(i), Some(x / y));
    }
}

#[test]
fn test_null_iff_either_input_null() {
    let a = Column::with_nulls(&[1.0f64, 2.0, 3.0, 4.0], &[0b0000_1110]).unwrap();
    let b = Column::with_nulls(&[1.0f64, 2.0, 3.0, 4.0], &[0b0000_0111]).unwrap();
    let out = a.add(&b).unwrap();
    assert_eq!(out.get::<f64>(0), None); // a null
    assert_eq!(out.get::<f64>(1), Some(4.0));
    assert_eq!(out.get::<f64>(2), Some(6.0));
    assert_eq!(out.get::<f64>(3), None); // b null
}

#[test]
fn test_compare_masks() {
    let col = Column::from_slice(&[5i64, -1, 3, 7]).unwrap();
    let mask = col.compare_scalar(3i64, CmpOp::Ge).unwrap();
    assert_eq!(mask.dtype(), DType::Bool);
    assert_eq!(mask.as_mask().unwrap(), &[1, 0, 1, 1]);

    let filtered = col.filter(&mask).unwrap();
    assert_eq!(filtered.values::<i64>().unwrap(), &[5, 3, 7]);
}

#[test]
fn test_empty_column_operations() {
    let col = Column::new_empty(DType::I64);
    assert!(col.filter(&Column::from_mask(vec![])).unwrap().is_empty());
    assert!(col.gather(&[]).unwrap().is_empty());
    assert!(col.sort(true).unwrap().is_empty());
    assert!(col.argsort(true).unwrap().is_empty());
    assert_eq!(col.sum::<i64>().unwrap(), 0);
}

#[test]
fn test_sort_and_argsort_agree() {
    let data = [0.5f64, -2.0, 8.0, 3.5, -2.0];
    let col = Column::from_slice(&data).unwrap();

    let sorted = col.sort(true).unwrap();
    assert_eq!(sorted.values::<f64>().unwrap(), &[-2.0, -2.0, 0.5, 3.5, 8.0]);

    let perm = col.argsort(true).unwrap();
    let indices: Vec<i64> = perm.into_iter().map(i64::from).collect();
    let gathered = col.gather(&indices).unwrap();
    assert_eq!(
        gathered.values::<f64>().unwrap(),
        sorted.values::<f64>().unwrap()
    );
}

#[test]
fn test_interop_export_import() {
    let data = [1.0f64, 2.0, 3.0, 4.0];
    let col = Column::with_nulls(&data, &[0b0000_1011]).unwrap();
    let record = quiver_kernel::export_column(&col);
    assert_eq!(record.length, 4);
    assert_eq!(record.null_count, 1);

    let copied = unsafe { quiver_kernel::import_borrowed::<f64>(&record) }.unwrap();
    assert_eq!(copied.len(), 4);
    assert_eq!(copied.null_count(), 1);
    assert_eq!(copied.get::<f64>(2), None);
    assert_eq!(copied.get::<f64>(3), Some(4.0));
}
