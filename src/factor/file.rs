// Copyright (C) 2016-2018 ERGO-Code
// Copyright (C) 2022-2023 Richard Lincoln

// Line file
//
// A line file stores lines of entries held in caller-owned parallel arrays
// (for example row index and value). Entries of a line are contiguous. Lines
// can be in any order in memory and there can be gaps between them.
//
//     begin[k]        first element of line 0 <= k < nlines
//     end[k]          one past the last element of line k
//     begin[nlines]   first element of unused space
//     end[nlines]     limit of the file
//
// `next`, `prev` form a double linked list of the lines that own memory, in
// the order in which they appear. `next[nlines]` and `prev[nlines]` are the
// first respectively last line. A line that owns no memory links to itself.

#[derive(Debug, Clone, Default)]
pub(crate) struct LineFile {
    pub(crate) begin: Vec<usize>,
    pub(crate) end: Vec<usize>,
    next: Vec<usize>,
    prev: Vec<usize>,
}

impl LineFile {
    /// Empty file of `nlines` lines and `limit` elements.
    pub(crate) fn new(nlines: usize, limit: usize) -> Self {
        let mut begin = vec![0; nlines + 1];
        let mut end = vec![0; nlines + 1];
        begin[nlines] = 0;
        end[nlines] = limit;
        Self {
            begin,
            end,
            next: (0..=nlines).collect(),
            prev: (0..=nlines).collect(),
        }
    }

    pub(crate) fn nlines(&self) -> usize {
        self.begin.len() - 1
    }

    pub(crate) fn len(&self, line: usize) -> usize {
        self.end[line] - self.begin[line]
    }

    pub(crate) fn range(&self, line: usize) -> std::ops::Range<usize> {
        self.begin[line]..self.end[line]
    }

    /// First unused element.
    pub(crate) fn used(&self) -> usize {
        self.begin[self.nlines()]
    }

    pub(crate) fn limit(&self) -> usize {
        self.end[self.nlines()]
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        let n = self.nlines();
        debug_assert!(limit >= self.begin[n]);
        self.end[n] = limit;
    }

    /// Unused space at the end of the file.
    pub(crate) fn free(&self) -> usize {
        self.limit() - self.used()
    }

    /// Entries held by all lines, not counting room and gaps.
    pub(crate) fn entries(&self) -> usize {
        self.lines().iter().map(|&line| self.len(line)).sum()
    }

    pub(crate) fn is_linked(&self, line: usize) -> bool {
        self.next[line] != line
    }

    /// Elements that can be appended to `line` without moving it.
    pub(crate) fn room(&self, line: usize) -> usize {
        if !self.is_linked(line) {
            return 0;
        }
        self.begin[self.next[line]] - self.end[line]
    }

    fn unlink(&mut self, line: usize) {
        let (prev, next) = (self.prev[line], self.next[line]);
        self.next[prev] = next;
        self.prev[next] = prev;
        self.next[line] = line;
        self.prev[line] = line;
    }

    fn link_last(&mut self, line: usize) {
        let n = self.nlines();
        let last = self.prev[n];
        self.prev[n] = line;
        self.next[line] = n;
        self.prev[line] = last;
        self.next[last] = line;
    }

    /// Make `line` own `len` elements starting at the first unused element,
    /// plus `extra` elements of room. The caller has written the entries.
    pub(crate) fn place(&mut self, line: usize, len: usize, extra: usize) {
        let n = self.nlines();
        debug_assert!(!self.is_linked(line));
        let begin = self.begin[n];
        debug_assert!(begin + len + extra <= self.limit());
        self.begin[line] = begin;
        self.end[line] = begin + len;
        self.begin[n] = begin + len + extra;
        self.link_last(line);
    }

    /// Empty `line` and give up its memory.
    pub(crate) fn release(&mut self, line: usize) {
        if self.is_linked(line) {
            self.unlink(line);
        }
        self.begin[line] = 0;
        self.end[line] = 0;
    }

    /// Move `line` to the end of the file with `extra` elements of room.
    /// Requires `len(line) + extra <= free()`. Returns the old begin.
    ///
    /// The last line in memory is extended in place if possible.
    pub(crate) fn reappend<A: Copy, B: Copy>(
        &mut self,
        line: usize,
        extra: usize,
        a: &mut [A],
        b: &mut [B],
    ) -> usize {
        let n = self.nlines();
        let ibeg = self.begin[line];
        let iend = self.end[line];
        if self.is_linked(line) && self.next[line] == n && iend + extra <= self.limit() {
            self.begin[n] = self.begin[n].max(iend + extra);
            return ibeg;
        }
        let mut used = self.begin[n];
        assert!(iend - ibeg + extra <= self.free());
        self.begin[line] = used;
        for pos in ibeg..iend {
            a[used] = a[pos];
            b[used] = b[pos];
            used += 1;
        }
        self.end[line] = used;
        self.begin[n] = used + extra;
        if self.is_linked(line) {
            self.unlink(line);
        }
        self.link_last(line);
        ibeg
    }

    /// Pack all lines to the front in memory order, leaving `stretch·len +
    /// pad` room behind each. Returns the old begin of every line.
    pub(crate) fn compress<A: Copy, B: Copy>(
        &mut self,
        a: &mut [A],
        b: &mut [B],
        stretch: f64,
        pad: usize,
    ) -> Vec<usize> {
        let n = self.nlines();
        let old_begin = self.begin.clone();
        let mut line = self.next[n];
        let mut used = 0;
        let mut total = 0;
        let mut count = 0;
        while line != n {
            total += self.len(line);
            count += 1;
            line = self.next[line];
        }
        // padding only if all of it fits
        let padded = total + count * pad + (stretch * total as f64) as usize;
        let with_room = padded <= self.limit();

        let mut line = self.next[n];
        while line != n {
            let ibeg = self.begin[line];
            let iend = self.end[line];
            debug_assert!(ibeg >= used);
            self.begin[line] = used;
            for pos in ibeg..iend {
                a[used] = a[pos];
                b[used] = b[pos];
                used += 1;
            }
            self.end[line] = used;
            line = self.next[line];
        }
        self.begin[n] = used;
        if with_room && (pad > 0 || stretch > 0.0) {
            self.spread(a, b, |_, len| pad + (stretch * len as f64) as usize);
        }
        old_begin
    }

    /// Pack all lines to the front in memory order and leave `room[line]`
    /// elements behind each. A line that owns no memory but wants room is
    /// placed at the end. The result must fit into the file. Returns the old
    /// begin of every line.
    pub(crate) fn compress_with_room<A: Copy, B: Copy>(
        &mut self,
        a: &mut [A],
        b: &mut [B],
        room: &[usize],
    ) -> Vec<usize> {
        let old_begin = self.compress(a, b, 0.0, 0);
        self.spread(a, b, |line, _| room[line]);
        for (line, &extra) in room.iter().enumerate() {
            if extra > 0 && !self.is_linked(line) {
                self.place(line, 0, extra);
            }
        }
        old_begin
    }

    // Insert `room(line, len)` elements behind each line of a packed file,
    // moving lines from the back so that no line is overwritten before it
    // has moved.
    fn spread<A: Copy, B: Copy, F: Fn(usize, usize) -> usize>(
        &mut self,
        a: &mut [A],
        b: &mut [B],
        room: F,
    ) {
        let n = self.nlines();
        let lines = self.lines();
        let mut target = Vec::with_capacity(lines.len());
        let mut used = 0;
        for &line in &lines {
            target.push(used);
            let len = self.len(line);
            used += len + room(line, len);
        }
        debug_assert!(used <= self.limit());
        for (&line, &to) in lines.iter().zip(&target).rev() {
            let from = self.begin[line];
            let len = self.len(line);
            for p in (0..len).rev() {
                a[to + p] = a[from + p];
                b[to + p] = b[from + p];
            }
            self.begin[line] = to;
            self.end[line] = to + len;
        }
        self.begin[n] = used;
    }

    /// Lines in memory order.
    pub(crate) fn lines(&self) -> Vec<usize> {
        let n = self.nlines();
        let mut lines = Vec::new();
        let mut line = self.next[n];
        while line != n {
            lines.push(line);
            line = self.next[line];
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(lines: &[&[usize]], limit: usize) -> (LineFile, Vec<usize>, Vec<f64>) {
        let mut file = LineFile::new(lines.len(), limit);
        let mut index = vec![0; limit];
        let mut value = vec![0.0; limit];
        for (k, entries) in lines.iter().enumerate() {
            let start = file.used();
            for (p, &i) in entries.iter().enumerate() {
                index[start + p] = i;
                value[start + p] = i as f64;
            }
            file.place(k, entries.len(), 0);
        }
        (file, index, value)
    }

    #[test]
    fn room_and_reappend_of_last() {
        let (mut file, _, _) = file_with(&[&[1, 2], &[3]], 10);
        assert_eq!(file.room(0), 0);
        assert_eq!(file.room(1), 0);
        assert_eq!(file.free(), 7);
        let old = file.reappend(1, 3, &mut [0; 10], &mut [0.0; 10]);
        assert_eq!(old, 2);
        assert_eq!(file.range(1), 2..3);
        assert_eq!(file.room(1), 3);
        file.release(1);
        assert_eq!(file.room(1), 0);
        assert!(!file.is_linked(1));
    }

    #[test]
    fn reappend_and_compress() {
        let (mut file, mut index, mut value) = file_with(&[&[1, 2], &[3], &[4, 5, 6]], 16);
        let old = file.reappend(0, 2, &mut index, &mut value);
        assert_eq!(old, 0);
        assert_eq!(file.range(0), 6..8);
        assert_eq!(file.room(0), 2);
        assert_eq!(file.lines(), vec![1, 2, 0]);

        let old = file.compress(&mut index, &mut value, 0.0, 0);
        assert_eq!(old[0], 6);
        assert_eq!(file.range(1), 0..1);
        assert_eq!(file.range(2), 1..4);
        assert_eq!(file.range(0), 4..6);
        assert_eq!(&index[4..6], &[1, 2]);
        assert_eq!(value[5], 2.0);
        assert_eq!(file.used(), 6);
        assert_eq!(file.free(), 10);
    }

    #[test]
    fn compress_with_room_for_chosen_lines() {
        let (mut file, mut index, mut value) = file_with(&[&[1, 2], &[3], &[4, 5, 6]], 8);
        file.release(1);
        file.compress_with_room(&mut index, &mut value, &[1, 1, 0]);
        assert_eq!(file.range(0), 0..2);
        assert_eq!(file.room(0), 1);
        assert_eq!(file.range(2), 3..6);
        assert_eq!(&index[3..6], &[4, 5, 6]);
        assert_eq!(file.room(2), 0);
        // the released line gets its room at the end
        assert_eq!(file.range(1), 6..6);
        assert_eq!(file.room(1), 1);
        assert_eq!(file.entries(), 5);
        assert_eq!(file.free(), 1);
    }

    #[test]
    fn compress_pads_when_it_fits() {
        let (mut file, mut index, mut value) = file_with(&[&[1], &[2]], 8);
        file.compress(&mut index, &mut value, 0.0, 2);
        assert_eq!(file.range(0), 0..1);
        assert_eq!(file.range(1), 3..4);
        assert_eq!(file.used(), 6);
    }
}
