use std::collections::BTreeMap;

use arbtest::{arbitrary, arbtest};
use cowjson_core::Value;

#[derive(arbitrary::Arbitrary, Debug)]
enum ArrayOp {
    Push(u32),
    PushFront(u32),
    // Set(index, x) writes `x` at `index`, modulo one past the end.
    Set(u8, u32),
    Remove(u8),
    Take(u8),
    Resize(u8),
    Snapshot,
}

impl ArrayOp {
    fn apply_to_vec(&self, vec: &mut Vec<u64>) -> Option<u64> {
        match self {
            ArrayOp::Push(x) => vec.push(u64::from(*x)),
            ArrayOp::PushFront(x) => vec.insert(0, u64::from(*x)),
            ArrayOp::Set(index, x) => {
                let index = *index as usize % (vec.len() + 1);
                if index == vec.len() {
                    vec.push(u64::from(*x));
                } else {
                    vec[index] = u64::from(*x);
                }
            }
            ArrayOp::Remove(index) => {
                if (*index as usize) < vec.len() {
                    vec.remove(*index as usize);
                }
            }
            ArrayOp::Take(index) => {
                return Some(if (*index as usize) < vec.len() {
                    vec.remove(*index as usize)
                } else {
                    0
                });
            }
            ArrayOp::Resize(len) => vec.resize(*len as usize % 16, 0),
            ArrayOp::Snapshot => {}
        }

        None
    }

    fn apply_to_value(
        &self,
        value: &mut Value,
        arena: &mut Vec<(Value, Vec<u64>)>,
        model: &[u64],
    ) -> Option<u64> {
        match self {
            ArrayOp::Push(x) => {
                value.push_back(*x).unwrap();
            }
            ArrayOp::PushFront(x) => {
                value.push_front(*x).unwrap();
            }
            ArrayOp::Set(index, x) => {
                let index = *index as usize % (value.count() + 1);
                *value.at_mut(index).unwrap() = Value::from(*x);
            }
            ArrayOp::Remove(index) => value.remove(*index as usize),
            ArrayOp::Take(index) => return Some(value.take(*index as usize).to_u64()),
            ArrayOp::Resize(len) => value.resize(*len as usize % 16),
            ArrayOp::Snapshot => arena.push((value.clone(), model.to_vec())),
        }

        None
    }
}

#[derive(arbitrary::Arbitrary, Debug)]
enum ObjectOp {
    Set(u8, u32),
    Remove(u8),
    Take(u8),
    Snapshot,
}

fn key(k: u8) -> String {
    format!("k{}", k % 6)
}

fn array_view(value: &Value) -> Vec<u64> {
    value.iter().map(Value::to_u64).collect()
}

fn object_view(value: &Value) -> BTreeMap<Vec<u8>, u64> {
    value
        .entries()
        .map(|(key, field)| (key.to_vec(), field.to_u64()))
        .collect()
}

#[test]
fn array_mutations_preserve_snapshots() {
    arbtest(|u| {
        let mut vec = Vec::new();
        let mut value = Value::null();
        let mut arena = Vec::new();
        let ops: Vec<ArrayOp> = u.arbitrary()?;

        for op in ops {
            let model = vec.clone();
            let expected = op.apply_to_vec(&mut vec);
            let taken = op.apply_to_value(&mut value, &mut arena, &model);

            assert_eq!(expected, taken);
            assert_eq!(vec, array_view(&value));

            for (snapshot, frozen) in &arena {
                assert_eq!(frozen, &array_view(snapshot));
            }
        }

        Ok(())
    });
}

#[test]
fn object_mutations_preserve_snapshots() {
    arbtest(|u| {
        let mut map = BTreeMap::new();
        let mut value = Value::null();
        let mut arena: Vec<(Value, BTreeMap<Vec<u8>, u64>)> = Vec::new();
        let ops: Vec<ObjectOp> = u.arbitrary()?;

        for op in ops {
            match op {
                ObjectOp::Set(k, x) => {
                    map.insert(key(k).into_bytes(), u64::from(x));
                    *value.at_key_mut(key(k)).unwrap() = Value::from(x);
                }
                ObjectOp::Remove(k) => {
                    map.remove(key(k).as_bytes());
                    value.remove_key(key(k));
                }
                ObjectOp::Take(k) => {
                    let expected = map.remove(key(k).as_bytes()).unwrap_or(0);
                    assert_eq!(value.take_key(key(k)).to_u64(), expected);
                }
                ObjectOp::Snapshot => arena.push((value.clone(), map.clone())),
            }

            assert_eq!(map, object_view(&value));
            assert!(value.keys().zip(value.keys().skip(1)).all(|(a, b)| a < b));

            for (snapshot, frozen) in &arena {
                assert_eq!(frozen, &object_view(snapshot));
            }
        }

        Ok(())
    });
}

#[test]
fn nested_writes_never_leak_into_copies() {
    arbtest(|u| {
        let mut value = Value::null();
        let paths: Vec<(u8, u8, u32)> = u.arbitrary()?;
        let mut snapshots = Vec::new();

        for (outer, inner, x) in paths {
            let before = value.clone();
            let expected = serde_json::Value::from(&before);

            let slot = value.at_key_mut(key(outer)).unwrap();
            let index = inner as usize % (slot.count() + 1);
            *slot.at_mut(index).unwrap() = Value::from(x);

            assert_eq!(value[key(outer).as_str()][index].to_u32(), x);
            snapshots.push((before, expected));
        }

        for (snapshot, expected) in &snapshots {
            assert_eq!(&serde_json::Value::from(snapshot), expected);
        }

        Ok(())
    });
}
