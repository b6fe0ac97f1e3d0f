use encoding8::ascii;
use std::fmt::Write;

// Dumps out the slice in a pretty way, one row of 16 bytes per line.
pub fn hexdump(slice: &[u8]) -> String {
    const WIDTH: usize = 16;
    let mut out = String::new();

    for (i, row) in slice.chunks(WIDTH).enumerate() {
        let row_hex: String = row.iter().map(|x| format!("{0:02X} ", x)).collect();

        // For each byte on this row, only print out the ascii printable ones.
        let row_str: String = row
            .iter()
            .map(|x| {
                if x.is_ascii() && ascii::is_printable(*x) {
                    *x as char
                } else {
                    '.'
                }
            })
            .collect();

        // Writing to a String can not fail.
        let _ = writeln!(out, "{0:>08x}: {1:<48} {2:}", i * WIDTH, row_hex, row_str);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hexdump() {
        let got = hexdump(b"\x12\x34example\x00\x01\x00\x01\xff\xfe\xfd\xfc\x03com");
        let want = "00000000: 12 34 65 78 61 6D 70 6C 65 00 01 00 01 FF FE FD  .4example.......\n\
                    00000010: FC 03 63 6F 6D                                   ..com\n";
        assert_eq!(got, want);
    }
}
