use super::RecordType;

/// A contiguous run of lines from the input file.
pub type Chunk = Vec<String>;

/// Partition `lines` into about `target` chunks that can be parsed independently.
///
/// A `200` record closes the chunk being built and opens a new one, so a `200`
/// record always shares a chunk with the `300` records that follow it. Once exactly
/// `target - 1` chunks are closed and the current `200` group has seen its first
/// `300`, splitting stops and every remaining line goes into the last chunk.
///
/// Only the first `target - 1` groups are isolated (a leading `100` record counts
/// as one of them). The last chunk holds everything else and can be much larger
/// than the others.
// TODO: balance the tail by splitting on every 200 and round-robining groups
// once callers no longer depend on the current chunk boundaries.
pub fn split_into_chunks<I, L>(lines: I, target: usize) -> Vec<Chunk>
where
    I: IntoIterator<Item = L>,
    L: Into<String>,
{
    let target = target.max(1);
    let mut chunks: Vec<Chunk> = Vec::with_capacity(target);
    let mut current: Chunk = Vec::new();
    let mut in_nmi_group = false;
    let mut splitting = true;

    for line in lines {
        let line = line.into();
        if !splitting {
            current.push(line);
            continue;
        }

        let record_type = RecordType::of_line(&line);
        if record_type == RecordType::NmiDetails {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            in_nmi_group = true;
        }

        current.push(line);

        if record_type == RecordType::IntervalData && in_nmi_group {
            in_nmi_group = false;
        }

        if chunks.len() == target - 1 && !in_nmi_group {
            splitting = false;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_NMIS: &str = "100,NEM12,200506081149,UNITEDDP,NEMMCO
200,NEM1201009,E1E2,1,E1,N1,01009,kWh,30,20050610
300,20050301,0,0,0,0,0,0,0,0,0,0,0,0,0.461,0.810,0.568,1.234
200,NEM1201010,E1E2,1,E1,N1,01010,kWh,30,20050610
300,20050301,0,0,0,0,0,0,0,0,0,0,0,0,0.461,0.810,0.568,1.234
900";

    #[test]
    fn two_chunks_put_the_file_header_first() {
        let chunks = split_into_chunks(TWO_NMIS.lines(), 2);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], vec!["100,NEM12,200506081149,UNITEDDP,NEMMCO"]);
        assert!(chunks[1][0].starts_with("200,NEM1201009"));
        assert_eq!(chunks[1].len(), 5);
        assert_eq!(chunks[1].last().map(String::as_str), Some("900"));
    }

    #[test]
    fn enough_chunks_isolate_each_nmi_group() {
        let chunks = split_into_chunks(TWO_NMIS.lines(), 8);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 1);
        assert!(chunks[1][0].starts_with("200,NEM1201009"));
        assert_eq!(chunks[1].len(), 2);
        assert!(chunks[2][0].starts_with("200,NEM1201010"));
        assert_eq!(chunks[2].len(), 3);
    }

    #[test]
    fn single_chunk_keeps_every_line() {
        let chunks = split_into_chunks(TWO_NMIS.lines(), 1);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 6);

        let zero = split_into_chunks(TWO_NMIS.lines(), 0);
        assert_eq!(zero, chunks);
    }

    #[test]
    fn remaining_groups_pile_into_the_last_chunk() {
        let mut lines = vec!["100,NEM12".to_string()];
        for i in 0..10 {
            lines.push(format!("200,NMI{i},E1,1,E1,N1,1,kWh,30,20050610"));
            lines.push("300,20050301".to_string());
            lines.push("300,20050302".to_string());
        }
        lines.push("900".to_string());

        let chunks = split_into_chunks(lines.clone(), 4);

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], vec!["100,NEM12"]);
        assert_eq!(chunks[1].len(), 3);
        assert_eq!(chunks[2].len(), 3);
        assert!(chunks[3][0].starts_with("200,NMI2,"));
        assert_eq!(chunks[3].len(), 8 * 3 + 1);
        assert_eq!(chunks.concat(), lines);
    }

    #[test]
    fn nmi_group_is_not_split_before_its_first_interval_record() {
        let lines = [
            "200,NMI0,E1,1,E1,N1,1,kWh,30,20050610",
            "300,20050301",
            "200,NMI1,E1,1,E1,N1,1,kWh,30,20050610",
            "200,NMI2,E1,1,E1,N1,1,kWh,30,20050610",
            "300,20050301",
        ];

        let chunks = split_into_chunks(lines, 2);

        // The second group has no 300 before the next 200, so it closes as its own chunk.
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], vec!["200,NMI1,E1,1,E1,N1,1,kWh,30,20050610"]);
        assert_eq!(chunks[2].len(), 2);
    }

    #[test]
    fn empty_input_has_no_chunks() {
        assert!(split_into_chunks(Vec::<String>::new(), 4).is_empty());
    }
}
