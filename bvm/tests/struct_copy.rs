//! Struct copy fixtures
//!
//! The single most consequential defect class in this model is a struct
//! copy that moves a pointer field's address words but drops its bank
//! words. A struct assignment is one bulk copy of the full computed
//! extent, and these tests hold it to that.

use bvm::machine::Machine;
use bvm_common::{BankId, FatPtr, Word};
use bvm_layout::{calculate_struct_layout, FieldDecl, TypeDesc};
use pretty_assertions::assert_eq;

#[test]
fn struct_assignment_preserves_pointer_field_bank() {
    let mut m = Machine::new(256);
    let data_bank = m.alloc_bank();
    let struct_bank = m.alloc_bank();

    // struct S { int tag; int *p; }
    let fields = vec![
        FieldDecl::new("tag", TypeDesc::Int),
        FieldDecl::new("p", TypeDesc::pointer(TypeDesc::Int)),
    ];
    let layout = calculate_struct_layout(Some("S"), &fields).unwrap();
    assert_eq!(layout.total_size, 6); // 2 + 4 words
    let s_ty = TypeDesc::Struct {
        name: Some("S".to_string()),
        fields,
    };

    // the pointee: an int valued 42 in an unrelated bank
    let value = FatPtr::new(data_bank, 100);
    m.store_int(value, 42).unwrap();

    let s1 = FatPtr::new(struct_bank, 0);
    let s2 = s1.add(layout.total_size as i32, 1);
    let tag_off = layout.offset_of("tag").unwrap() as i32;
    let p_off = layout.offset_of("p").unwrap() as i32;

    m.store_int(s1.add(tag_off, 1), 7).unwrap();
    m.store_ptr(s1.add(p_off, 1), value).unwrap();

    // s2 = s1
    m.copy_object(s2, s1, &s_ty).unwrap();

    let copied = m.load_ptr(s2.add(p_off, 1)).unwrap();
    assert_eq!(copied.bank, data_bank); // the tag traveled with the copy
    assert_eq!(copied, value);
    assert_eq!(m.load_int(copied).unwrap(), 42);
    assert_eq!(m.load_int(s2.add(tag_off, 1)).unwrap(), 7);
}

#[test]
fn nested_struct_fields_flatten_at_the_embedding_point() {
    // struct Inner { char c; char *s; }
    // struct Outer { int n; struct Inner inner; int m; }
    let inner = TypeDesc::Struct {
        name: Some("Inner".to_string()),
        fields: vec![
            FieldDecl::new("c", TypeDesc::Char),
            FieldDecl::new("s", TypeDesc::pointer(TypeDesc::Char)),
        ],
    };
    let fields = vec![
        FieldDecl::new("n", TypeDesc::Int),
        FieldDecl::new("inner", inner),
        FieldDecl::new("m", TypeDesc::Int),
    ];
    let layout = calculate_struct_layout(Some("Outer"), &fields).unwrap();

    assert_eq!(layout.total_size, 9); // 2 + (1 + 4) + 2
    assert_eq!(layout.offset_of("n"), Some(0));
    assert_eq!(layout.offset_of("inner.c"), Some(2));
    assert_eq!(layout.offset_of("inner.s"), Some(3));
    assert_eq!(layout.offset_of("m"), Some(7));

    // a store through the flattened offset reads back through the nested one
    let mut m = Machine::new(256);
    let bank = m.alloc_bank();
    let base = FatPtr::new(bank, 20);
    let s_off = layout.offset_of("inner.s").unwrap() as i32;

    let target = FatPtr::new(BankId(1), 5);
    m.store_ptr(base.add(s_off, 1), target).unwrap();
    assert_eq!(m.load_ptr(base.add(3, 1)).unwrap(), target);
}

#[test]
fn copy_of_nested_struct_moves_every_field() {
    let inner = TypeDesc::Struct {
        name: None,
        fields: vec![
            FieldDecl::new("a", TypeDesc::Int),
            FieldDecl::new("p", TypeDesc::pointer(TypeDesc::Int)),
        ],
    };
    let fields = vec![
        FieldDecl::new("head", TypeDesc::Char),
        FieldDecl::new("body", inner),
    ];
    let layout = calculate_struct_layout(None, &fields).unwrap();

    let mut m = Machine::new(256);
    let data_bank = m.alloc_bank();
    let bank = m.alloc_bank();

    let pointee = FatPtr::new(data_bank, 33);
    m.store_int(pointee, -5).unwrap();

    let src = FatPtr::new(bank, 0);
    let dst = FatPtr::new(bank, 64);

    m.store_char(src.add(layout.offset_of("head").unwrap() as i32, 1), i32::from(b'H'))
        .unwrap();
    m.store_int(src.add(layout.offset_of("body.a").unwrap() as i32, 1), 9)
        .unwrap();
    m.store_ptr(src.add(layout.offset_of("body.p").unwrap() as i32, 1), pointee)
        .unwrap();

    m.copy_words(dst, src, layout.total_size).unwrap();

    assert_eq!(
        m.load_char(dst.add(layout.offset_of("head").unwrap() as i32, 1))
            .unwrap(),
        Word::from(b'H')
    );
    assert_eq!(
        m.load_int(dst.add(layout.offset_of("body.a").unwrap() as i32, 1))
            .unwrap(),
        9
    );
    let p = m
        .load_ptr(dst.add(layout.offset_of("body.p").unwrap() as i32, 1))
        .unwrap();
    assert_eq!(m.load_int(p).unwrap(), -5);
}

#[test]
fn copying_a_struct_onto_itself_does_not_corrupt_it() {
    let ty = TypeDesc::Struct {
        name: None,
        fields: vec![
            FieldDecl::new("x", TypeDesc::Int),
            FieldDecl::new("p", TypeDesc::pointer(TypeDesc::Char)),
        ],
    };

    let mut m = Machine::new(256);
    let bank = m.alloc_bank();
    let s = FatPtr::new(bank, 10);

    m.store_int(s, 1234).unwrap();
    m.store_ptr(s.add(2, 1), FatPtr::new(bank, 99)).unwrap();

    m.copy_object(s, s, &ty).unwrap();

    assert_eq!(m.load_int(s).unwrap(), 1234);
    assert_eq!(m.load_ptr(s.add(2, 1)).unwrap(), FatPtr::new(bank, 99));
}

#[test]
fn struct_array_elements_copy_independently() {
    // struct Pair { int a; int b; } pairs[3]
    let pair = TypeDesc::Struct {
        name: Some("Pair".to_string()),
        fields: vec![
            FieldDecl::new("a", TypeDesc::Int),
            FieldDecl::new("b", TypeDesc::Int),
        ],
    };
    let stride = pair.size_in_words();
    assert_eq!(stride, 4);

    let mut m = Machine::new(256);
    let bank = m.alloc_bank();
    let base = FatPtr::new(bank, 0);

    for i in 0..3 {
        let e = base.add(i, stride);
        m.store_int(e, 10 + i).unwrap();
        m.store_int(e.add(1, 2), 20 + i).unwrap();
    }

    // pairs[0] = pairs[2]
    m.copy_words(base, base.add(2, stride), stride).unwrap();

    assert_eq!(m.load_int(base).unwrap(), 12);
    assert_eq!(m.load_int(base.add(1, 2)).unwrap(), 22);
    // the middle element is untouched
    assert_eq!(m.load_int(base.add(1, stride)).unwrap(), 11);
}
