//! Branch distance management.
//!
//! A branch is encoded either short (opcode + i8, 2 bytes) or long (opcode +
//! i32, 5 bytes). Whether a branch can be short depends on the distance to
//! its target, and that distance depends on which branches in between are
//! long. Elements that branch therefore emit in two passes:
//!
//! 1. Emit into a scratch [`Emitter`] with every branch short, recording each
//!    branch start and label position relative to the element origin.
//! 2. [`BranchManager::compute_branches`] decides which branches must be long.
//! 3. Emit again into the real stream; the manager replays the frozen
//!    decisions in order and patches displacements in [`BranchManager::finish`].
//!
//! [`BranchManager::run`] packages the sequence.

use crate::bytecode::BranchKind;

use super::Emitter;

/// Bytes a long branch adds over a short one.
pub const LONG_BRANCH_ADJUST: usize = 3;

const SHORT_BRANCH_LEN: usize = 2;
const LONG_BRANCH_LEN: usize = SHORT_BRANCH_LEN + LONG_BRANCH_ADJUST;

/// A branch target inside one element.
///
/// Labels are numbered in definition order, so both passes hand out the same
/// labels as long as they emit the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Measure,
    Final,
}

/// One branch recorded during measurement.
#[derive(Debug, Clone)]
pub struct BranchRecord {
    /// Offset of the branch instruction in the measured (all short) stream.
    pub start: usize,
    /// Label the branch jumps to.
    pub target: Label,
    /// Target offset: measured at first, real once computed.
    pub end: usize,
    /// Offset of the branch instruction in the real stream.
    pub adjusted_start: usize,
    /// Whether the branch needs the long encoding.
    pub is_long: bool,
    kind: BranchKind,
}

impl BranchRecord {
    fn len(&self) -> usize {
        if self.is_long {
            LONG_BRANCH_LEN
        } else {
            SHORT_BRANCH_LEN
        }
    }
}

/// A branch emitted in the final pass, awaiting its displacement.
#[derive(Debug)]
struct Fixup {
    record: usize,
    operand: usize,
    instruction_end: usize,
}

/// Computes short/long encodings and patches branch displacements for one
/// element.
#[derive(Debug)]
pub struct BranchManager {
    phase: Phase,
    /// Stream offset the current pass started at.
    origin: usize,
    next_label: u32,
    /// Label offsets relative to the origin, per pass.
    measured_labels: Vec<Option<usize>>,
    final_labels: Vec<Option<usize>>,
    branches: Vec<BranchRecord>,
    /// Next record to replay in the final pass.
    cursor: usize,
    fixups: Vec<Fixup>,
    measured_len: usize,
}

impl Default for BranchManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchManager {
    pub fn new() -> Self {
        Self {
            phase: Phase::Measure,
            origin: 0,
            next_label: 0,
            measured_labels: Vec::new(),
            final_labels: Vec::new(),
            branches: Vec::new(),
            cursor: 0,
            fixups: Vec::new(),
            measured_len: 0,
        }
    }

    /// Emit `body` through both passes.
    pub fn run(em: &mut Emitter, mut body: impl FnMut(&mut Emitter, &mut BranchManager)) {
        let mut manager = BranchManager::new();
        let mut scratch = em.scratch();
        manager.begin(&scratch);
        body(&mut scratch, &mut manager);
        manager.compute_branches(&scratch);
        manager.begin(em);
        body(em, &mut manager);
        manager.finish(em);
    }

    /// Start a pass at the emitter's current position.
    pub fn begin(&mut self, em: &Emitter) {
        self.origin = em.len();
        self.next_label = 0;
        self.cursor = 0;
    }

    /// Allocate the next label.
    pub fn define_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        let needed = self.next_label as usize;
        if self.measured_labels.len() < needed {
            self.measured_labels.resize(needed, None);
            self.final_labels.resize(needed, None);
        }
        label
    }

    /// Mark `label` at the current position.
    pub fn mark_label(&mut self, em: &Emitter, label: Label) {
        let position = em.len() - self.origin;
        let slot = match self.phase {
            Phase::Measure => &mut self.measured_labels[label.0 as usize],
            Phase::Final => &mut self.final_labels[label.0 as usize],
        };
        *slot = Some(position);
    }

    /// Emit a branch to `label`.
    pub fn emit_branch(&mut self, em: &mut Emitter, kind: BranchKind, label: Label) {
        let start = em.len() - self.origin;
        match self.phase {
            Phase::Measure => {
                self.branches.push(BranchRecord {
                    start,
                    target: label,
                    end: 0,
                    adjusted_start: start,
                    is_long: false,
                    kind,
                });
                em.emit_branch_placeholder(kind, false);
            }
            Phase::Final => {
                let index = self.cursor;
                self.cursor += 1;
                let record = &self.branches[index];
                assert!(
                    record.kind == kind && record.target == label,
                    "branch {index} differs between passes"
                );
                assert_eq!(
                    record.adjusted_start, start,
                    "branch {index} starts at a different offset than computed"
                );
                let operand = em.emit_branch_placeholder(kind, record.is_long);
                self.fixups.push(Fixup {
                    record: index,
                    operand,
                    instruction_end: start + record.len(),
                });
            }
        }
    }

    /// Recorded branches, in emission order.
    pub fn branches(&self) -> &[BranchRecord] {
        &self.branches
    }

    /// Number of branches that need the long encoding.
    pub fn long_count(&self) -> usize {
        self.branches.iter().filter(|b| b.is_long).count()
    }

    /// Decide the encoding of every measured branch.
    ///
    /// A branch that does not fit in `i8` becomes long, which pushes later
    /// code (and possibly other targets) 3 bytes further. Long flags only
    /// ever turn on, so repeating until nothing changes terminates.
    pub fn compute_branches(&mut self, scratch: &Emitter) {
        self.measured_len = scratch.len() - self.origin;
        for branch in &mut self.branches {
            // Unmarked labels cannot occur in a well-formed element.
            branch.end = self.measured_labels[branch.target.0 as usize]
                .unwrap_or_else(|| panic!("label {} was never marked", branch.target.0));
        }

        loop {
            let mut changed = false;
            for i in 0..self.branches.len() {
                if self.branches[i].is_long {
                    continue;
                }
                let branch = &self.branches[i];
                let target = self.real_offset(branch.end) as isize;
                let from = (self.real_offset(branch.start) + SHORT_BRANCH_LEN) as isize;
                if i8::try_from(target - from).is_err() {
                    self.branches[i].is_long = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        for i in 0..self.branches.len() {
            let adjusted_start = self.real_offset(self.branches[i].start);
            let end = self.real_offset(self.branches[i].end);
            let branch = &mut self.branches[i];
            branch.adjusted_start = adjusted_start;
            branch.end = end;
        }
        self.phase = Phase::Final;

        tracing::trace!(
            branches = self.branches.len(),
            long = self.long_count(),
            "computed branch encodings"
        );
    }

    /// Offset in the real stream of a measured offset: every long branch
    /// starting before it adds 3 bytes.
    fn real_offset(&self, measured: usize) -> usize {
        let long_before = self
            .branches
            .iter()
            .filter(|b| b.is_long && b.start < measured)
            .count();
        measured + LONG_BRANCH_ADJUST * long_before
    }

    /// Patch every branch emitted in the final pass.
    pub fn finish(self, em: &mut Emitter) {
        let real_len = em.len() - self.origin;
        assert_eq!(
            real_len,
            self.measured_len + LONG_BRANCH_ADJUST * self.long_count(),
            "final emission length does not match the computed layout"
        );
        assert_eq!(self.cursor, self.branches.len(), "not every branch was replayed");

        for fixup in &self.fixups {
            let record = &self.branches[fixup.record];
            let target = self.final_labels[record.target.0 as usize]
                .unwrap_or_else(|| panic!("label {} was never marked", record.target.0));
            assert_eq!(target, record.end, "label moved between passes");

            let displacement = target as isize - fixup.instruction_end as isize;
            if record.is_long {
                let displacement = i32::try_from(displacement)
                    .unwrap_or_else(|_| panic!("branch displacement {displacement} exceeds i32"));
                em.patch_i32(fixup.operand, displacement);
            } else {
                let displacement = i8::try_from(displacement).unwrap_or_else(|_| {
                    panic!("short branch displacement {displacement} does not fit i8")
                });
                em.patch_i8(fixup.operand, displacement);
            }
        }
    }
}
