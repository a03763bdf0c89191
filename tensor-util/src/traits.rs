use crate::common_io::Delimiter;
use rand::Rng;

/// Random matrix draws, sized `dd x nn`
pub trait SampleOps {
    type Mat;
    type Scalar;

    /// Entries i.i.d. uniform on `[0, 1)`
    fn runif(dd: usize, nn: usize) -> Self::Mat;

    /// Entries i.i.d. standard normal
    fn rnorm(dd: usize, nn: usize) -> Self::Mat;

    /// Entries i.i.d. standard normal, all drawn from the caller's `rng`
    /// so a fixed seed reproduces the matrix
    fn rnorm_using<R: Rng>(dd: usize, nn: usize, rng: &mut R) -> Self::Mat;

    /// Entries i.i.d. `Gamma(shape, scale)` with `param = (shape, scale)`;
    /// the rate parameterization is `rate = 1/scale`
    fn rgamma(dd: usize, nn: usize, param: (f64, f64)) -> Self::Mat;
}

/// Matrix input and output through delimited text files
pub trait IoOps {
    type Scalar;
    type Mat;

    fn read_file_delim(
        file: &str,
        delim: impl Into<Delimiter>,
        skip: Option<usize>,
    ) -> anyhow::Result<Self::Mat>;

    fn from_tsv(tsv_file: &str, skip: Option<usize>) -> anyhow::Result<Self::Mat> {
        Self::read_file_delim(tsv_file, &['\t', ' '], skip)
    }

    fn write_file_delim(&self, file: &str, delim: &str) -> anyhow::Result<()>;

    fn to_tsv(&self, tsv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(tsv_file, "\t")
    }

    fn to_csv(&self, csv_file: &str) -> anyhow::Result<()> {
        self.write_file_delim(csv_file, ",")
    }
}
