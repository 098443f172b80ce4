mod test_connect_preamble;
