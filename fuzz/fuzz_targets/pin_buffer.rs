#![no_main]
use libfuzzer_sys::fuzz_target;
use iris_wire::{
    root,
    table::{ForwardsUOffset, Table},
    CueList, Pin, PinSlices, VoteRequest,
};

/// Poke at a table whose contents the verifier never looked at.
fn read_opaque(table: Table) {
    for slot in 0..4 {
        let _ = table.scalar_at::<u64>(slot, 0);
        let _ = table.get::<ForwardsUOffset<&str>>(slot);
        if let Some(inner) = table.get::<ForwardsUOffset<Table>>(slot) {
            let _ = inner.scalar_at::<u32>(0, 0);
        }
    }
}

fuzz_target!(|data: &[u8]| {
    if let Ok(pin) = root::<Pin>(data) {
        let _ = pin.id();
        let _ = pin.tags().iter().count();
        let _ = pin.properties().iter().count();
        match pin.slices() {
            PinSlices::Untyped { tables, .. } => tables.iter().for_each(read_opaque),
            slices => {
                let _ = slices.len();
            }
        }
        let _ = pin.to_owned();
    }
    if let Ok(request) = root::<VoteRequest>(data) {
        let _ = request.term();
        if let Some(candidate) = request.candidate() {
            read_opaque(candidate);
        }
    }
    if let Ok(list) = root::<CueList>(data) {
        let _ = list.name();
        list.cues().iter().for_each(read_opaque);
    }
    let _ = Pin::decode(data);
    let _ = VoteRequest::decode(data);
});
