use crate::common_io::{read_lines_of_words_delim, write_lines, Delimiter};
use crate::traits::IoOps;
use ndarray::prelude::*;
use std::fmt::{Debug, Display};
use std::str::FromStr;

impl<T> IoOps for Array2<T>
where
    T: FromStr + Send + Display,
    <T as FromStr>::Err: Debug,
{
    type Scalar = T;
    type Mat = Self;

    fn read_file_delim(
        file: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat> {
        // negative marks "no header row"
        let hdr_line = skip.map(|s| s as i64).unwrap_or(-1);

        let lines_of_words = read_lines_of_words_delim(file, delim, hdr_line)?.rows;

        if lines_of_words.is_empty() {
            return Err(anyhow::anyhow!("no data in {}", file));
        }

        let nrows = lines_of_words.len();
        let ncols = lines_of_words[0].len();

        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, words) in lines_of_words.iter().enumerate() {
            if words.len() != ncols {
                return Err(anyhow::anyhow!(
                    "ragged line {} in {}: {} vs. {} words",
                    i + 1,
                    file,
                    words.len(),
                    ncols
                ));
            }
            for word in words.iter() {
                let x = word
                    .parse::<T>()
                    .map_err(|e| anyhow::anyhow!("failed to parse {:?}: {:?}", word, e))?;
                data.push(x);
            }
        }

        Ok(Array2::from_shape_vec((nrows, ncols), data)?)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()> {
        let mut lines: Vec<Box<str>> = Vec::with_capacity(self.nrows());
        for row in self.rows() {
            let words: Vec<String> = row.iter().map(|x| x.to_string()).collect();
            lines.push(words.join(delim).into_boxed_str());
        }
        write_lines(&lines, file)
    }
}
