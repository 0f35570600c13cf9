fn main() {
    pegma::cli::run();
}
